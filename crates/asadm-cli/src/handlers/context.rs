use crate::config::Config;
use crate::presentation::renderers::{self, RenderOptions, TerminalSize};
use crate::presentation::sheet::{SheetDecl, Sources, build};
use crate::types::{ColorChoice, OutputFormat};
use anyhow::Result;
use is_terminal::IsTerminal;
use serde::Serialize;
use serde_json::Value;

/// What every handler needs to print its result.
pub struct HandlerContext {
    pub format: OutputFormat,
    pub config: Config,
    pub color: bool,
    pub terminal: TerminalSize,
}

impl HandlerContext {
    pub fn new(format: OutputFormat, config: Config, color: Option<ColorChoice>) -> Self {
        let stdout_is_terminal = std::io::stdout().is_terminal();
        let color = color
            .unwrap_or(config.display.color)
            .enabled(stdout_is_terminal);

        let terminal = if stdout_is_terminal {
            TerminalSize::detect()
        } else {
            TerminalSize::default()
        };

        Self {
            format,
            config,
            color,
            terminal,
        }
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Build `decl` over `sources` and print it in the selected format.
    pub fn print_sheet(
        &self,
        decl: SheetDecl,
        title: &str,
        description: Option<String>,
        sources: &Sources,
    ) -> Result<()> {
        let display = &self.config.display;
        let decl = decl.placeholders(&display.no_entry, &display.error_entry);

        let mut sheet = build(&decl, title, sources, &Value::Null);
        sheet.description = description;

        match self.format {
            OutputFormat::Json => self.print_json(&sheet.records_json()),
            OutputFormat::Plain => {
                let options = RenderOptions {
                    color: self.color,
                    title_repeat: display.title_repeat,
                    terminal: self.terminal,
                };
                if let Some(text) = renderers::render(&sheet, &options)? {
                    print!("{}", text);
                }
                Ok(())
            }
        }
    }
}
