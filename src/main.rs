#![deny(missing_docs)]

//! The point of entry for lvs. Call this executable to extract a circuit
//! from a CIF layout and verify it against a transistor netlist.

use anyhow::{Context, Result};
use argh::FromArgs;
use lvs_core::{graph, layout::LayoutCircuit, schematic, verify::verify};
use std::path::PathBuf;

#[derive(FromArgs)]
#[argh(description = "layout-versus-schematic verifier")]
struct Args {
    #[argh(option, description = "path to the CIF-like layout file")]
    cif: PathBuf,
    #[argh(option, description = "path to the transistor netlist file")]
    net: PathBuf,
    #[argh(option, description = "optional output path for the layout graph JSON")]
    graph_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();

    let cif_text = std::fs::read_to_string(&args.cif)
        .with_context(|| format!("failed to read layout {:?}", args.cif))?;
    let net_text = std::fs::read_to_string(&args.net)
        .with_context(|| format!("failed to read netlist {:?}", args.net))?;

    let mut circuit = LayoutCircuit::from_records(lvs_cif::cif::parse_cif(&cif_text));
    let layout_graph = circuit.to_graph();
    let schematic_graph = schematic::build_graph(&lvs_cif::netlist::parse_netlist(&net_text));

    if let Some(path) = &args.graph_out {
        let json = serde_json::to_string_pretty(&graph::to_json(&layout_graph))?;
        std::fs::write(path, json).with_context(|| format!("failed to write {:?}", path))?;
    }

    let verdict = verify(&layout_graph, &schematic_graph);
    if verdict.equivalent {
        println!("Equivalent. ({:.6} s)", verdict.elapsed_seconds);
    } else {
        println!(
            "NOT equivalent; suspect node ids {:?}. ({:.6} s)",
            verdict.discrepant_nodes, verdict.elapsed_seconds
        );
        std::process::exit(1);
    }
    Ok(())
}
