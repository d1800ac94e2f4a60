use apl_databinding::context::{Context, RootConfig};
use apl_databinding::dependant::{Dependant, watch};
use apl_databinding::dimension::Metrics;
use apl_databinding::evaluator::{evaluate, parse_data_binding};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

fn main() -> rustyline::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("APL data-binding REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type a template such as ${{1 + 2}} to evaluate it, or :help for commands.");
    println!();

    let mut rl = DefaultEditor::new()?;
    let context = Context::create_root(Metrics::default(), RootConfig::default());
    let mut watches: Vec<(String, Rc<Dependant>)> = Vec::new();

    loop {
        match rl.readline("apl> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
                match command {
                    ":help" => print_help(),
                    ":env" => print_environment(&context),
                    ":set" => {
                        set_binding(&context, rest);
                        for (template, dependant) in &watches {
                            println!("  {} => {}", template, dependant.value());
                        }
                    }
                    ":get" => match context.require(rest.trim()) {
                        Ok(value) => println!("{}", value.eval().to_debug_string()),
                        Err(e) => println!("Error: {}", e),
                    },
                    ":watch" => match watch(&context, rest) {
                        Ok(dependant) => {
                            println!("{}", dependant.value());
                            watches.push((rest.to_string(), dependant));
                        }
                        Err(e) => println!("Error: {}", e),
                    },
                    ":debug" => match parse_data_binding(&context, rest) {
                        Ok(parsed) => println!("{}", parsed.to_debug_string()),
                        Err(e) => println!("Error: {}", e),
                    },
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => println!("{}", evaluate(&context, line).to_debug_string()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted. Use Ctrl+D or :quit to exit.");
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// `:set name template` writes a user binding, creating it on first use
fn set_binding(context: &Rc<Context>, args: &str) {
    let Some((name, template)) = args.trim().split_once(' ') else {
        println!("Usage: :set <name> <template>");
        return;
    };
    let value = evaluate(context, template.trim());
    if context.has(name) {
        if !context.user_write(name, value) {
            println!("Error: '{}' is not user writeable", name);
        }
    } else {
        context.put_user_writeable(name, value);
    }
}

fn print_help() {
    println!("Commands:");
    println!("  :help                   - Show this help message");
    println!("  :env                    - Show the bindings of the root context");
    println!("  :get <name>             - Show the current value of a binding");
    println!("  :set <name> <template>  - Evaluate a template and store it in a writeable binding");
    println!("  :watch <template>       - Track a template; it is re-shown after every :set");
    println!("  :debug <template>       - Show the parsed expression tree");
    println!("  :quit, :exit            - Exit");
    println!();
    println!("Examples:");
    println!("  ${{viewport.width > 500 ? 'wide' : 'narrow'}}");
    println!("  :set count ${{3}}");
    println!("  You have ${{count}} item${{count == 1 ? '' : 's'}}");
    println!("  ${{Math.max(count, 10) * 2dp}}");
    println!("  ${{Time.year(utcTime)}}");
}

fn print_environment(context: &Context) {
    for name in context.names() {
        let kind = context
            .kind(&name)
            .map(|kind| format!("{:?}", kind))
            .unwrap_or_default();
        println!("  {:<12} {:<16} {}", name, kind, context.opt(&name).to_debug_string());
    }
}
