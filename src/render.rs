use crate::core::task::Task;

const PLACEHOLDER_ICON: &str = "?";

/// One line per task: id, category icon and name, check box, content, user, date, urgency.
pub fn render_task(task: &Task) -> String {
    let (icon, name) = match task.category.info() {
        Ok(info) => (info.icon, info.name),
        Err(e) => {
            log::error!("Cannot render category for task {}: {}", task.id, e);
            (PLACEHOLDER_ICON, "")
        }
    };
    let check = if task.checked { "[x]" } else { "[ ]" };

    let mut line = format!(
        "{:>4}  {} {:<9} {} {}",
        task.id, icon, name, check, task.content
    );
    if !task.user.is_empty() {
        line.push_str(&format!("  @{}", task.user));
    }
    let date = task.date.display();
    if !date.is_empty() {
        line.push_str(&format!("  {}", date));
    }
    line.push_str(&format!("  <{}>", task.urgency));
    line
}

pub fn render_list(tasks: &[&Task]) -> String {
    if tasks.is_empty() {
        return "No tasks.\n".to_string();
    }
    let mut out = String::new();
    for task in tasks {
        out.push_str(&render_task(task));
        out.push('\n');
    }
    out
}
