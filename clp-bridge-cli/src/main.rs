//! Command-line driver for the clp-bridge crate.
//!
//! Runs small goals on the in-process [`LoopbackEngine`] and prints what
//! the engine flushes to its queue streams, exercising the resume protocol
//! end to end: flushes, waits for input and yields.
//!
//! Engine options are read from the environment (see [`EngineConfig`]).
//!
//! [`LoopbackEngine`]: clp_bridge::LoopbackEngine
//! [`EngineConfig`]: clp_bridge::EngineConfig

use clap::{Parser as ClapParser, Subcommand};
use clp_bridge::{
    Atom, Bridge, BridgeError, Compound, EngineConfig, LoopbackEngine, Outcome, StreamId, Term,
    Var, compound,
};
use std::io::Write;
use std::mem;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Writes the given words as a list to the output stream
    Echo {
        /// Words to echo
        words: Vec<String>,
    },
    /// Reads text from the input stream and writes it back
    Read {
        /// Text supplied when the engine waits for input
        text: String,
    },
    /// Yields to the host and prints the value passed back
    Yield {
        /// Value passed back to the engine
        #[arg(short, long, default_value_t = 42)]
        reply: i64,
    },
    /// Prints sizes
    Sizes {},
}

/// Reads the stream id a flush or wait outcome carries.
fn stream_id(payload: Option<&Term>) -> Result<StreamId, BridgeError> {
    let id = payload
        .and_then(Term::as_int)
        .ok_or_else(|| BridgeError::Stream("resume reported no stream id".into()))?;
    StreamId::try_from(id)
        .map_err(|_| BridgeError::Stream(format!("stream id {id} out of range").into()))
}

/// Resumes until the query succeeds or fails, serving flushes, waits and
/// yields along the way.
fn drive(
    bridge: &mut Bridge<LoopbackEngine>,
    input: Option<&str>,
    reply: Option<i64>,
) -> Result<Outcome, BridgeError> {
    let mut pass: Option<Term> = None;
    loop {
        let (outcome, payload) = bridge.resume(pass.take().as_ref())?;
        log::debug!("resume -> {:?}", outcome);
        match outcome {
            Outcome::Succeeded | Outcome::Failed => return Ok(outcome),
            Outcome::FlushIO => {
                let id = stream_id(payload.as_ref())?;
                let data = bridge.stream_by_id(id)?.read_all()?;
                print!("{}", String::from_utf8_lossy(&data));
            }
            Outcome::WaitIO => {
                let id = stream_id(payload.as_ref())?;
                let Some(text) = input else {
                    log::error!("engine waits for input on stream {id}, none given");
                    return Ok(Outcome::Failed);
                };
                bridge
                    .stream_by_id(id)?
                    .write_all(text.as_bytes())
                    .map_err(|e| BridgeError::Stream(e.to_string().into()))?;
            }
            Outcome::Yielded => {
                if let Some(value) = &payload {
                    println!("yielded: {}", value.display(&*bridge));
                }
                pass = Some(Term::Int(reply.unwrap_or_default()));
            }
        }
    }
}

fn main() -> Result<(), BridgeError> {
    env_logger::init();

    let args = Args::parse();

    if let Commands::Sizes {} = args.command {
        println!("Size of Term: {}", mem::size_of::<Term>());
        println!("Size of Option<Term>: {}", mem::size_of::<Option<Term>>());
        println!("Size of Compound: {}", mem::size_of::<Compound>());
        println!("Size of Outcome: {}", mem::size_of::<Outcome>());
        return Ok(());
    }

    let mut bridge = Bridge::new(LoopbackEngine::new());
    bridge.configure(&EngineConfig::from_env()?)?;
    if bridge.init() {
        log::error!("engine initialization failed");
        return Err(BridgeError::NotInitialized);
    }

    let output = Atom::new(&mut bridge, "output")?;
    let flush = compound!("flush"; output.clone() => &mut bridge)?;

    let outcome = match args.command {
        Commands::Echo { words } => {
            let write = compound!("writeln"; output.clone(), words => &mut bridge)?;
            bridge.post_goal(write)?;
            bridge.post_goal(flush)?;
            drive(&mut bridge, None, None)?
        }
        Commands::Read { text } => {
            let x = Var::new(&mut bridge)?;
            let input = Atom::new(&mut bridge, "input")?;
            let read = compound!("read_string"; input, x.clone() => &mut bridge)?;
            let write = compound!("writeln"; output.clone(), x => &mut bridge)?;
            bridge.post_goal(read)?;
            bridge.post_goal(write)?;
            bridge.post_goal(flush)?;
            drive(&mut bridge, Some(&text), None)?
        }
        Commands::Yield { reply } => {
            let x = Var::new(&mut bridge)?;
            let ping = Atom::new(&mut bridge, "ping")?;
            let ask = compound!("yield"; ping, x.clone() => &mut bridge)?;
            let write = compound!("writeln"; output.clone(), x => &mut bridge)?;
            bridge.post_goal(ask)?;
            bridge.post_goal(write)?;
            bridge.post_goal(flush)?;
            drive(&mut bridge, None, Some(reply))?
        }
        Commands::Sizes {} => Outcome::Succeeded,
    };

    println!("{:?}", outcome);
    if bridge.cleanup() {
        log::warn!("engine cleanup failed");
    }
    Ok(())
}
