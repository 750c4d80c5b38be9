//! Interactive console bound to the live emulation

use crate::emulation::LiveNetwork;
use console::style;
use std::io::{BufRead, Write};

/// Blocking command loop. Returning from `attach` is the sole teardown
/// trigger for the launch profiles.
pub trait Console {
    fn attach(&self, net: &dyn LiveNetwork) -> anyhow::Result<()>;
}

/// Console on stdin/stdout.
pub struct StdConsole;

impl Console for StdConsole {
    fn attach(&self, net: &dyn LiveNetwork) -> anyhow::Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        println!("{}", net.describe());
        println!("Type `help` for the available commands.");

        loop {
            print!("{} ", style("testbed>").cyan().bold());
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                // EOF behaves like `exit`
                println!();
                return Ok(());
            }

            let mut parts = line.split_whitespace();
            match parts.next() {
                None => {}
                Some("exit" | "quit") => return Ok(()),
                Some("help") => {
                    println!("nodes                 list the emulated devices");
                    println!("exec <node> <cmd...>  run a command inside a device's namespace");
                    println!("exit                  leave the console and tear the emulation down");
                }
                Some("nodes") => {
                    for id in net.node_ids() {
                        println!("* {id}");
                    }
                }
                Some("exec") => {
                    let Some(node_id) = parts.next() else {
                        eprintln!("usage: exec <node> <cmd...>");
                        continue;
                    };
                    let command = parts.collect::<Vec<_>>().join(" ");
                    if command.is_empty() {
                        eprintln!("usage: exec <node> <cmd...>");
                        continue;
                    }
                    match net.node(node_id).and_then(|node| node.run(&command)) {
                        Ok(output) => print!("{output}"),
                        Err(error) => eprintln!("{} {error:#}", style("error:").red()),
                    }
                }
                Some(other) => {
                    eprintln!("unknown command `{other}`; type `help`");
                }
            }
        }
    }
}
