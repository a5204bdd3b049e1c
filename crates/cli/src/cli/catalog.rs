//! `remote-deck actions` / `remote-deck feedbacks`.

use rd_client::schema::Definition;

pub fn actions(json: bool) -> anyhow::Result<()> {
    print_definitions(&rd_client::commands::definitions(), json)
}

pub fn feedbacks(json: bool) -> anyhow::Result<()> {
    print_definitions(&rd_client::feedback::definitions(), json)
}

fn print_definitions(defs: &[Definition], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(defs)?);
    } else {
        for line in format_table(defs) {
            println!("{line}");
        }
    }
    Ok(())
}

/// One line per definition: id, name and option ids.
pub fn format_table(defs: &[Definition]) -> Vec<String> {
    let width = defs.iter().map(|d| d.id.len()).max().unwrap_or(0);
    defs.iter()
        .map(|d| {
            let mut line = format!("{:<width$}  {}", d.id, d.name);
            if !d.options.is_empty() {
                let ids: Vec<&str> = d.options.iter().map(|o| o.id.as_str()).collect();
                line.push_str(&format!("  [{}]", ids.join(", ")));
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_options() {
        let lines = format_table(&rd_client::commands::definitions());
        let set_channel = lines.iter().find(|l| l.starts_with("setChannel")).unwrap();
        assert!(set_channel.contains("[selectedChannel]"));
        let mute = lines.iter().find(|l| l.starts_with("muteMicrophone")).unwrap();
        assert!(!mute.contains('['));
    }
}
