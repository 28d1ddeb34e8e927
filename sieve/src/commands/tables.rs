// sieve/src/commands/tables.rs
//
// USE CASE: Show which fields each detector will look at.

use comfy_table::{Table, presets::UTF8_FULL};
use std::path::Path;

pub fn execute(project_dir: &Path) -> anyhow::Result<()> {
    let config = super::load_config_or_default(project_dir)?;
    let registry = config.registry();

    let methods: Vec<&str> = config.detection.methods.iter().map(|m| m.as_str()).collect();
    println!("📋 {} (v{}) | methods: {}", config.name, config.version, methods.join(", "));

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "table",
        "numeric fields",
        "text fields (avg length)",
        "key",
        "rules",
    ]);

    for (name, fields) in registry.tables() {
        let text: Vec<String> = fields
            .text_fields
            .iter()
            .map(|f| format!("{} ({})", f, registry.average_length(f)))
            .collect();
        table.add_row(vec![
            name.clone(),
            fields.numeric_fields.join(", "),
            text.join(", "),
            fields.key_field.clone().unwrap_or_default(),
            fields
                .rule_set
                .map(|r| format!("{:?}", r))
                .unwrap_or_default(),
        ]);
    }

    println!("{table}");
    Ok(())
}
