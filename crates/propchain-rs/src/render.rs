//! Rendering merged properties for output.

use anyhow::Context;
use clap::ValueEnum;
use java_properties::PropertiesWriter;
use propchain_rs_config::MergedProperties;

/// Output encodings supported by [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// `key=value` lines sorted by key.
    #[default]
    Properties,
    /// A flat JSON object.
    Json,
}

/// Render `properties` in the requested format.
pub fn render(properties: &MergedProperties, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Properties => {
            let mut buf = Vec::new();
            {
                let mut writer = PropertiesWriter::new(&mut buf);
                for (key, value) in properties {
                    writer
                        .write(key, value)
                        .with_context(|| format!("failed to write property {key}"))?;
                }
                writer.finish().context("failed to flush properties")?;
            }
            String::from_utf8(buf).context("properties output is not valid UTF-8")
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(properties).context("failed to encode properties as JSON")
        }
    }
}
