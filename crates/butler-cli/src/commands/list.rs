//! Implementation of the `butler list` command.

use butler_core::{application::TemplateService, domain::TemplateEntry};

use crate::{
    cli::{ListArgs, ListFormat},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(args: ListArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let catalog = TemplateService::new(config.templates)?;
    let templates: Vec<&TemplateEntry> = catalog.list().collect();

    match args.format {
        ListFormat::Table => {
            if templates.is_empty() {
                output.info("No templates configured.")?;
                output.print("  Add [[templates]] entries to the file shown by 'butler config path'")?;
                return Ok(());
            }
            output.header("Available Templates:")?;
            let width = templates.iter().map(|t| t.name.len()).max().unwrap_or(0);
            for template in &templates {
                output.print(&format!(
                    "  {:<width$}  {}",
                    template.name,
                    describe(template),
                ))?;
            }
        }

        // Printed even in quiet mode; scripts depend on it.
        ListFormat::Json => output.json(&templates)?,

        ListFormat::List => {
            for template in &templates {
                println!("{}", template.name);
            }
        }

        ListFormat::Csv => {
            println!("name,url,description");
            for template in &templates {
                println!(
                    "{},{},{}",
                    csv_field(&template.name),
                    csv_field(&template.url),
                    csv_field(&template.description)
                );
            }
        }
    }

    Ok(())
}

fn describe(template: &TemplateEntry) -> String {
    if template.description.is_empty() {
        template.url.clone()
    } else {
        format!("{} ({})", template.description, template.url)
    }
}

/// Quote a field when it holds a separator, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}
