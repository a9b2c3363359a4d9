//! # pdes-cli::builtin
//!
//! The element library compiled into the binary: a ping/pong pair for
//! smoke-testing models and a generator that builds ping/pong graphs
//! programmatically. External component libraries would register here
//! through the same factory interface.

use bytes::Bytes;
use pdes_engine::prelude::*;
use pdes_types::errors::ConfigError;

/// Sends `count` pings on its `port` link and withdraws its exit vote
/// once the last reply arrives.
struct Ping {
    remaining: u64,
    link: Option<LinkId>,
}

impl Component for Ping {
    fn setup(&mut self, ctx: &mut Ctx) -> Result<(), SimError> {
        let link = ctx
            .configure_link("port", Some("1 ns"), Some(0))?
            .ok_or_else(|| SimError::PortUnbound("port".to_string()))?;
        self.link = Some(link);
        ctx.register_exit();
        if self.remaining > 0 {
            ctx.send(link, 0, Bytes::from_static(b"ping"))?;
        } else {
            ctx.unregister_exit();
        }
        Ok(())
    }

    fn on_event(
        &mut self,
        ctx: &mut Ctx,
        _handler: HandlerId,
        payload: Option<Bytes>,
    ) -> Result<(), SimError> {
        if payload.is_none() {
            return Ok(());
        }
        self.remaining -= 1;
        tracing::debug!(target: "events", comp = %ctx.name(), remaining = self.remaining, at = ctx.now(), "pong received");
        if self.remaining > 0 {
            ctx.send(self.link.expect("configured in setup"), 0, Bytes::from_static(b"ping"))?;
        } else {
            ctx.unregister_exit();
        }
        Ok(())
    }
}

/// Echoes every payload back on the link it arrived on.
struct Pong {
    link: Option<LinkId>,
}

impl Component for Pong {
    fn setup(&mut self, ctx: &mut Ctx) -> Result<(), SimError> {
        let link = ctx
            .configure_link("port", Some("1 ns"), Some(0))?
            .ok_or_else(|| SimError::PortUnbound("port".to_string()))?;
        self.link = Some(link);
        Ok(())
    }

    fn on_event(
        &mut self,
        ctx: &mut Ctx,
        _handler: HandlerId,
        payload: Option<Bytes>,
    ) -> Result<(), SimError> {
        if let Some(payload) = payload {
            ctx.send(self.link.expect("configured in setup"), 0, payload)?;
        }
        Ok(())
    }
}

/// Builds `pairs` ping/pong pairs joined by 10 ns links. The option
/// string is the pair count, defaulting to one.
fn ping_pong_generator(graph: &mut ConfigGraph, options: &str, _ranks: Rank) -> Result<(), ConfigError> {
    let pairs: u64 = options.trim().parse().unwrap_or(1);
    let mut lord = TimeLord::new("1 ps").map_err(ConfigError::Time)?;
    for i in 0..pairs {
        let ping = graph.add_component(&format!("ping{i}"), "builtin.ping");
        let pong = graph.add_component(&format!("pong{i}"), "builtin.pong");
        let wire = format!("wire{i}");
        graph.add_link(&mut lord, ping, &wire, "port", "10 ns")?;
        graph.add_link(&mut lord, pong, &wire, "port", "10 ns")?;
    }
    Ok(())
}

/// Registers every built-in component type and generator.
pub fn register(factory: &mut Factory) {
    factory.register_component("builtin.ping", |params: &Params| {
        Box::new(Ping {
            remaining: params.get_parsed_or("count", 10),
            link: None,
        })
    });
    factory.register_component("builtin.pong", |_| Box::new(Pong { link: None }));
    factory.register_generator("builtin.pingpong", ping_pong_generator);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ping_pong_model_runs_to_completion() {
        let mut factory = Factory::new();
        register(&mut factory);

        let mut graph = ConfigGraph::new();
        ping_pong_generator(&mut graph, "2", 1).unwrap();
        graph.set_component_ranks(0);
        assert!(graph.check_structure());

        let lord = TimeLord::new("1 ps").unwrap();
        let mut sim = Simulation::build(&graph, &factory, lord, Box::new(SingleRank)).unwrap();
        let elapsed = sim.run().unwrap();
        // Default count of ten: ping at even multiples of 10 ns, pong
        // replies at odd ones; the last reply lands at 200 ns.
        assert_eq!(elapsed, 200_000);
    }
}
