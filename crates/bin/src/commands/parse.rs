//! Parse command - shows how a composite path is read.

use firetree::query::{self, QueryDirective};

use crate::cli::ParseArgs;
use crate::output::{OutputFormat, print_json, print_table};

/// Run the parse command
pub fn run(args: &ParseArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = query::parse(&args.path)?;

    match format {
        OutputFormat::Human => {
            println!("Base path:   {}", parsed.base_path);
            println!(
                "Query id:    {}",
                parsed.query_id.as_deref().unwrap_or("-")
            );
            if parsed.directives.is_empty() {
                println!("No directives.");
                return Ok(());
            }
            println!();
            let rows: Vec<Vec<String>> = parsed
                .directives
                .iter()
                .enumerate()
                .map(|(i, directive)| {
                    vec![
                        (i + 1).to_string(),
                        directive.name().to_string(),
                        operand(directive),
                    ]
                })
                .collect();
            print_table(&["#", "DIRECTIVE", "OPERAND"], &rows);
        }
        OutputFormat::Json => print_json(&serde_json::to_value(&parsed)?, format)?,
    }

    Ok(())
}

fn operand(directive: &QueryDirective) -> String {
    match directive {
        QueryDirective::OrderByChild(field) => field.clone(),
        QueryDirective::LimitToFirst(n) | QueryDirective::LimitToLast(n) => n.to_string(),
        QueryDirective::EqualTo(bound)
        | QueryDirective::StartAt(bound)
        | QueryDirective::EndAt(bound) => bound.to_string(),
        _ => String::new(),
    }
}
