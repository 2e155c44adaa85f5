use super::HandlerContext;
use crate::args::ConfigCommand;
use crate::config::Config;
use crate::types::OutputFormat;
use anyhow::{Result, bail};
use std::path::Path;

pub fn handle(ctx: &HandlerContext, path: &Path, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => match ctx.format {
            OutputFormat::Json => ctx.print_json(&ctx.config),
            OutputFormat::Plain => {
                println!("# {}", path.display());
                print!("{}", toml::to_string_pretty(&ctx.config)?);
                Ok(())
            }
        },
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists; pass --force to overwrite", path.display());
            }
            Config::default().save_to(path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}
