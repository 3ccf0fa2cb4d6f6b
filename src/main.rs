use anyhow::Result;
use clap::Parser;
use rcalc::{repl::Repl, Calculator};
use std::process;

const EXAMPLES: &str = "\
Examples:
  rcalc \"3 + 5 * 2\"
  rcalc \"sqrt(16)\"
  rcalc \"sin(pi/2)\"
  rcalc -p 4 \"1/3\"      (options go before the expression)
  rcalc                (interactive mode)";

/// Command-line calculator with functions, constants, variables and fractions.
#[derive(Parser, Debug)]
#[command(version, after_help = EXAMPLES)]
struct Args {
    /// Number of decimal digits shown in results (1-20)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=20))]
    precision: Option<u8>,

    /// Expression to evaluate; everything after its first word is part of it.
    /// Starts interactive mode when omitted.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    expression: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut calculator = Calculator::new();
    if let Some(digits) = args.precision {
        calculator.set_precision(digits.into())?;
    }

    if args.expression.is_empty() {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        return Repl::new(calculator).run(stdin.lock(), &mut stdout);
    }

    let expression = args.expression.join(" ");
    match calculator.calculate(&expression) {
        Ok(result) => println!("{}", calculator.format_result(result)),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
    Ok(())
}
