use crate::output::{print_json, print_table};
use rollout_core::tools::ToolSet;

pub fn run(json: bool) -> anyhow::Result<()> {
    let tools = ToolSet::resolve()?;

    if json {
        return print_json(&tools);
    }

    let rows: Vec<Vec<String>> = tools
        .iter()
        .map(|(tool, path)| vec![tool.to_string(), path.display().to_string()])
        .collect();
    print_table(&["TOOL", "PATH"], &rows);
    Ok(())
}
