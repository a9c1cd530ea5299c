//! Runs ORA and QEA on a small glycolysis / TCA cycle library
//!
//! `cargo run --example enrichment [ORA METHOD] [QEA METHOD] [IMPORTANCE]`
//!
//! e.g. `RUST_LOG=debug cargo run --example enrichment fisher ga dgr`
use std::io;

use tracing_subscriber::EnvFilter;

use psea::library::{ImportanceMap, Pathway};
use psea::qea::BackgroundExecutor;
use psea::{
    AbundanceTable, AnalysisContext, AnalysisOptions, ClassLabels, CompoundId, Importance,
    Library, LookupResolver, PseaResult,
};

const COMPOUNDS: [(&str, &str); 10] = [
    ("C00031", "D-Glucose"),
    ("C00668", "Glucose 6-phosphate"),
    ("C00085", "Fructose 6-phosphate"),
    ("C00118", "Glyceraldehyde 3-phosphate"),
    ("C00022", "Pyruvate"),
    ("C00186", "Lactate"),
    ("C00158", "Citrate"),
    ("C00311", "Isocitrate"),
    ("C00026", "2-Oxoglutarate"),
    ("C00042", "Succinate"),
];

fn id(kegg: &str) -> PseaResult<CompoundId> {
    CompoundId::try_from(kegg)
}

fn pathway(id_: &str, name: &str, members: &[(&str, f64, f64)]) -> PseaResult<Pathway> {
    let mut rbc = ImportanceMap::new();
    let mut dgr = ImportanceMap::new();
    for (member, betweenness, degree) in members {
        rbc.insert(id(member)?, *betweenness)?;
        dgr.insert(id(member)?, *degree)?;
    }
    let members = members
        .iter()
        .map(|(member, _, _)| id(member))
        .collect::<PseaResult<_>>()?;
    Ok(Pathway::new(id_.into(), name, members)
        .with_importance(Importance::Betweenness, rbc)
        .with_importance(Importance::Degree, dgr))
}

fn library() -> PseaResult<Library> {
    let mut library = Library::default();
    library.add_pathway(pathway(
        "hsa00010",
        "Glycolysis / Gluconeogenesis",
        &[
            ("C00031", 0.1, 0.2),
            ("C00668", 0.3, 0.4),
            ("C00085", 0.25, 0.2),
            ("C00118", 0.2, 0.3),
            ("C00022", 0.4, 0.5),
            ("C00186", 0.0, 0.1),
        ],
    )?)?;
    library.add_pathway(pathway(
        "hsa00020",
        "Citrate cycle (TCA cycle)",
        &[
            ("C00022", 0.1, 0.2),
            ("C00158", 0.4, 0.3),
            ("C00311", 0.2, 0.2),
            ("C00026", 0.5, 0.4),
            ("C00042", 0.3, 0.3),
        ],
    )?)?;
    library.add_pathway(pathway(
        "hsa00620",
        "Pyruvate metabolism",
        &[("C00022", 0.6, 0.6), ("C00186", 0.2, 0.2), ("C00042", 0.1, 0.1)],
    )?)?;
    Ok(library)
}

fn resolver() -> PseaResult<LookupResolver> {
    let mut resolver = LookupResolver::default();
    for (kegg, name) in COMPOUNDS {
        resolver.insert(name, id(kegg)?);
    }
    Ok(resolver)
}

fn main() -> PseaResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let options = AnalysisOptions::parse(
        &args.next().unwrap_or_else(|| "hyperg".to_string()),
        &args.next().unwrap_or_else(|| "gt".to_string()),
        &args.next().unwrap_or_else(|| "rbc".to_string()),
    )?;

    let library = library()?;
    let resolver = resolver()?;

    println!("ORA ({})", options.ora_method());
    let ora = AnalysisContext::new(options.clone())
        .with_library(&library)
        .with_query(
            &["D-Glucose", "pyruvate", "Lactate", "Glucose 6-phosphate", "Caffeine"],
            &resolver,
        )?
        .run_ora()?;
    if let Some(result) = ora.result() {
        result.write_csv(io::stdout())?;
    }

    let columns: Vec<&str> = COMPOUNDS.iter().map(|(_, name)| *name).collect();
    let samples = 6;
    let data: Vec<f64> = (0..samples)
        .flat_map(|sample| {
            let case = if sample < 3 { 0.0 } else { 1.0 };
            (0..columns.len()).map(move |c| {
                let noise = ((sample * 7 + c * 3) % 5) as f64 * 0.1;
                // glycolysis is up in cases
                if c < 6 {
                    1.0 + case + noise
                } else {
                    2.0 + noise
                }
            })
        })
        .collect();
    let table = AbundanceTable::new(columns, samples, data)?;
    let labels = ClassLabels::categorical(&["ctrl", "ctrl", "ctrl", "case", "case", "case"]);

    println!("\nQEA ({})", options.qea_method());
    let qea = AnalysisContext::new(options)
        .with_library(&library)
        .run_qea(&table, &labels, &resolver, &BackgroundExecutor::new())?;
    if let Some(result) = qea.result() {
        result.write_csv(io::stdout())?;
    }
    if let Some(pvalues) = qea.compound_pvalues() {
        for (compound, pvalue) in pvalues {
            match pvalue {
                Some(p) => println!("{compound}\t{p:.4e}"),
                None => println!("{compound}\t-"),
            }
        }
    }
    Ok(())
}
