use structopt::StructOpt;
use thiserror::Error;

use wisp_engine as engine;
use wisp_wsdl as wsdl;

#[derive(Debug, Error)]
enum Error {
    #[error("Error parsing WSDL")]
    ParseError(#[from] wsdl::error::Error),

    #[error("Error reading arguments")]
    ArgsError(#[from] std::io::Error),

    #[error("Import produced fatal diagnostics")]
    ImportFailed,
}

#[derive(StructOpt)]
struct Args {
    /// Disable the wrapped-parameters convention; wrapper elements are kept
    /// as ordinary single-element messages.
    #[structopt(long)]
    unwrapped: bool,

    /// Never promote a reply part to the operation's return value.
    #[structopt(long)]
    no_return_inference: bool,

    /// Resolve fault details through the operation's serialization strategy
    /// instead of the plain element fallback.
    #[structopt(long)]
    message_format_faults: bool,

    input: String,
}

#[paw::main]
fn main(args: Args) -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let docs = wsdl::parse(&args.input)?;

    let options = engine::ImportOptions {
        wrapped: !args.unwrapped,
        use_message_format_faults: args.message_format_faults,
        return_policy: if args.no_return_inference {
            engine::ReturnPolicy::Never
        } else {
            engine::ReturnPolicy::InferFromRequest
        },
    };

    let result = engine::import_contracts(&docs, &options);

    for contract in &result.contracts {
        println!("contract {} ({})", contract.name, contract.namespace);
        for operation in &contract.operations {
            let kind = if operation.is_one_way() {
                "one-way"
            } else {
                "request-reply"
            };
            println!("  operation {} [{}]", operation.name, kind);

            for message in &operation.messages {
                let direction = match message.direction {
                    wisp_contract::Direction::Input => "in ",
                    wisp_contract::Direction::Output => "out",
                };
                let parts = message
                    .body
                    .parts
                    .iter()
                    .map(|part| part.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("    {} ({})", direction, parts);
            }
            for fault in &operation.faults {
                println!("    fault {}", fault.name);
            }
        }
    }

    for diagnostic in result.diagnostics.iter() {
        let level = if diagnostic.is_warning {
            "warning"
        } else {
            "error"
        };
        eprintln!("{}: {}", level, diagnostic.message);
    }

    if result.diagnostics.has_errors() {
        return Err(Error::ImportFailed);
    }
    Ok(())
}
