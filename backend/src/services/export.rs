use shared::{CollectionId, Todo};

/// Heading used for a collection: `MM.DD` for days, the raw identifier for copies.
pub fn title(id: &CollectionId) -> String {
    match id.date() {
        Some(date) => date.format("%m.%d").to_string(),
        None => id.to_string(),
    }
}

pub fn file_name(id: &CollectionId) -> String {
    format!("{}-todo.md", title(id))
}

/// Render a collection as a markdown checklist, pending tasks first.
pub fn render_markdown(id: &CollectionId, todos: &[Todo]) -> String {
    let mut out = format!("# {} Todo\n\n", title(id));

    if todos.is_empty() {
        out.push_str("No tasks\n");
        return out;
    }

    let (completed, pending): (Vec<&Todo>, Vec<&Todo>) =
        todos.iter().partition(|todo| todo.completed);

    if !pending.is_empty() {
        out.push_str("## Pending\n\n");
        for todo in &pending {
            out.push_str(&format!("- [ ] {}\n", todo.content));
        }
        out.push('\n');
    }

    if !completed.is_empty() {
        out.push_str("## Completed\n\n");
        for todo in &completed {
            out.push_str(&format!("- [x] {}\n", todo.content));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "---\nTotal: {} tasks, completed: {}\n",
        todos.len(),
        completed.len()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn todo(id: i64, content: &str, completed: bool) -> Todo {
        Todo {
            id,
            content: content.to_string(),
            completed,
            order: id,
            date: "2025-07-29".parse().unwrap(),
            created_at: Utc::now(),
            completed_at: completed.then(Utc::now),
        }
    }

    #[test]
    fn test_title_and_file_name() {
        let day: CollectionId = "2025-07-29".parse().unwrap();
        assert_eq!(title(&day), "07.29");
        assert_eq!(file_name(&day), "07.29-todo.md");

        let copy: CollectionId = "copy-20250729-5".parse().unwrap();
        assert_eq!(title(&copy), "copy-20250729-5");
    }

    #[test]
    fn test_render_empty() {
        let day: CollectionId = "2025-07-29".parse().unwrap();
        assert_eq!(render_markdown(&day, &[]), "# 07.29 Todo\n\nNo tasks\n");
    }

    #[test]
    fn test_render_sections_and_summary() {
        let day: CollectionId = "2025-07-29".parse().unwrap();
        let todos = vec![
            todo(1, "Write docs", false),
            todo(2, "Standup", true),
            todo(3, "Code review", false),
        ];

        let expected = "# 07.29 Todo\n\n\
            ## Pending\n\n\
            - [ ] Write docs\n\
            - [ ] Code review\n\n\
            ## Completed\n\n\
            - [x] Standup\n\n\
            ---\nTotal: 3 tasks, completed: 1\n";

        assert_eq!(render_markdown(&day, &todos), expected);
    }

    #[test]
    fn test_render_all_completed_has_no_pending_section() {
        let day: CollectionId = "2025-07-29".parse().unwrap();
        let markdown = render_markdown(&day, &[todo(1, "Done", true)]);

        assert!(!markdown.contains("## Pending"));
        assert!(markdown.ends_with("Total: 1 tasks, completed: 1\n"));
    }
}
