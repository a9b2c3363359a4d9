//! # pdes-cli::driver
//!
//! Orchestrates a run: builds or loads the configuration graph, checks
//! and partitions it, writes the requested dumps and archives, wires up
//! one simulation per rank, and runs them to completion.

use crate::{
    args::{Cli, RunMode},
    archive, builtin, model,
};
use anyhow::{bail, Context, Result};
use pdes_engine::{partition::run_partitioner, prelude::*};
use signal_hook::consts::{SIGINT, SIGTERM, SIGUSR1, SIGUSR2};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

pub fn exec(cli: Cli) -> Result<()> {
    crate::logging::init(cli.verbose, &cli.debug, cli.debug_file.as_deref())?;

    let mut lord = TimeLord::new(&cli.timebase)
        .with_context(|| format!("bad --timebase '{}'", cli.timebase))?;
    let mut factory = Factory::new();
    builtin::register(&mut factory);
    for path in cli.lib_path.iter().chain(&cli.add_lib_path) {
        tracing::debug!(path = %path.display(), "component library search path recorded");
    }

    let build_start = Instant::now();
    let mut stop_at = cli.stop_at.clone();
    let mut partitioner = cli.partitioner.clone();

    let mut graph = match cli.run_mode {
        RunMode::Run => archive::load(&cli.archive_file, cli.archive_type, 0)?,
        RunMode::Init | RunMode::Both => {
            if let Some(name) = &cli.generator {
                let mut graph = ConfigGraph::new();
                factory.generator(name)?(&mut graph, &cli.gen_options, cli.ranks)?;
                graph
            } else {
                let Some(path) = &cli.sdl_file else {
                    bail!("no sdl-file and no generator specified");
                };
                let model = load_model(path)?;
                stop_at = stop_at.or(model.config.stop_at.clone());
                partitioner = partitioner.or(model.config.partitioner.clone());
                model::build_graph(&model, &mut lord)?
            }
        }
    };
    if cli.verbose {
        println!(
            "# Graph construction took {:.3} seconds",
            build_start.elapsed().as_secs_f64()
        );
    }

    if !graph.check_structure() {
        bail!("structural errors found in the configuration graph");
    }

    let num_ranks = cli.ranks.max(1);
    let part_start = Instant::now();
    if num_ranks == 1 {
        graph.set_component_ranks(0);
    } else {
        let method = partitioner.as_deref().unwrap_or("linear");
        run_partitioner(&mut graph, &factory, method, num_ranks)?;
        if cli.verbose {
            println!(
                "# Partitioning with '{method}' took {:.3} seconds",
                part_start.elapsed().as_secs_f64()
            );
        }
    }

    write_dumps(&cli, &graph, num_ranks)?;

    if cli.run_mode == RunMode::Init {
        let path = archive::save(&graph, &cli.archive_file, cli.archive_type, 0)?;
        tracing::info!(path = %path.display(), "graph archived; init-only run complete");
        return Ok(());
    }

    let status_flag = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::new(AtomicBool::new(false));
    for sig in [SIGUSR1, SIGUSR2] {
        signal_hook::flag::register(sig, status_flag.clone())?;
    }
    for sig in [SIGINT, SIGTERM] {
        signal_hook::flag::register(sig, stop_flag.clone())?;
    }

    let run_start = Instant::now();
    let elapsed_cycles = if num_ranks == 1 {
        let mut sim = Simulation::build(&graph, &factory, lord, Box::new(SingleRank))?;
        sim.set_signal_flags(status_flag, stop_flag);
        if let Some(spec) = &stop_at {
            sim.set_stop_at(spec, None)?;
        }
        sim.run()?
    } else {
        run_ranks(&cli, graph, lord, stop_at.as_deref(), num_ranks, status_flag, stop_flag)?
    };

    if cli.verbose {
        println!(
            "# Simulation loop took {:.3} seconds",
            run_start.elapsed().as_secs_f64()
        );
    }
    println!("Simulation complete: {elapsed_cycles} core cycles simulated");
    Ok(())
}

fn load_model(path: &Path) -> Result<model::ModelFile> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => model::load(path),
        Some("xml") | Some("sdl") => bail!("the XML/SDL front end is not linked into this build"),
        Some("py") => bail!("the scripted-model front end is not linked into this build"),
        _ => bail!("unsupported model file type: {}", path.display()),
    }
}

/// Runs `num_ranks` simulations over the in-process loopback fabric, one
/// thread per rank, and returns the largest elapsed time.
fn run_ranks(
    cli: &Cli,
    graph: ConfigGraph,
    lord: TimeLord,
    stop_at: Option<&str>,
    num_ranks: Rank,
    status_flag: Arc<AtomicBool>,
    stop_flag: Arc<AtomicBool>,
) -> Result<SimTime> {
    let all_parse = cli.all_parse;
    let handles: Vec<_> = LoopbackFabric::cluster(num_ranks)
        .into_iter()
        .map(|mut fabric| {
            let graph = (all_parse || fabric.rank() == 0).then(|| graph.clone());
            let lord = lord.clone();
            let stop_at = stop_at.map(String::from);
            let (status_flag, stop_flag) = (status_flag.clone(), stop_flag.clone());
            std::thread::spawn(move || -> Result<SimTime> {
                let graph = match graph {
                    Some(graph) if all_parse => graph,
                    graph => fabric.broadcast_graph(graph),
                };
                let mut factory = Factory::new();
                builtin::register(&mut factory);
                let mut sim = Simulation::build(&graph, &factory, lord, Box::new(fabric))?;
                sim.set_signal_flags(status_flag, stop_flag);
                if let Some(spec) = &stop_at {
                    sim.set_stop_at(spec, None)?;
                }
                Ok(sim.run()?)
            })
        })
        .collect();

    let mut elapsed = 0;
    for handle in handles {
        let rank_elapsed = handle
            .join()
            .map_err(|_| anyhow::anyhow!("a rank thread panicked"))??;
        elapsed = elapsed.max(rank_elapsed);
    }
    Ok(elapsed)
}

fn write_dumps(cli: &Cli, graph: &ConfigGraph, num_ranks: Rank) -> Result<()> {
    if let Some(path) = &cli.dump_partition {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        for rank in 0..num_ranks {
            writeln!(file, "Rank: {rank} Component List:")?;
            for comp in graph.components().filter(|c| c.rank == rank) {
                writeln!(file, "   {} (ID={})", comp.name, comp.id)?;
                writeln!(file, "      -> type      {}", comp.type_name)?;
                writeln!(file, "      -> weight    {}", comp.weight)?;
                writeln!(file, "      -> linkcount {}", comp.links.len())?;
            }
        }
        tracing::info!(path = %path.display(), "partition dump written");
    }
    if let Some(path) = &cli.dump_config_graph {
        graph.dump_to_file(path, false)?;
        tracing::info!(path = %path.display(), "configuration graph dump written");
    }
    if let Some(path) = &cli.output_dot {
        graph.dump_to_file(path, true)?;
        tracing::info!(path = %path.display(), "dot output written");
    }
    Ok(())
}
