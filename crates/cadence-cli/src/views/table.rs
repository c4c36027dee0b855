use cadence_core::models::{AgendaItem, AgendaItemKind, Occurrence, Task, TaskMode};
use chrono::{DateTime, Utc};
use chrono_humanize::Humanize;
use comfy_table::{Attribute, Cell, Color, Row, Table};

use crate::util::short_id;

fn due_cell(due_at: Option<DateTime<Utc>>, completed: bool) -> Cell {
    let Some(due_at) = due_at else {
        return Cell::new("None");
    };

    let now = Utc::now();
    let text = format!("{} ({})", due_at.format("%Y-%m-%d %H:%M"), due_at.humanize());
    if completed {
        Cell::new(text).fg(Color::DarkGrey)
    } else if due_at < now {
        Cell::new(text).fg(Color::Red) // Overdue
    } else if due_at.date_naive() == now.date_naive() {
        Cell::new(text).fg(Color::Yellow) // Due today
    } else {
        Cell::new(text)
    }
}

fn recurrence_label(task: &Task) -> String {
    match task.recurrence_rule() {
        Ok(Some(rule)) => rule.to_string(),
        Ok(None) => "-".to_string(),
        Err(_) => "invalid".to_string(),
    }
}

pub fn display_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Repeats", "Due", "Status"]);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(&task.id)));

        let completed = task.completed_at.is_some();
        let mut title = String::new();
        if task.mode() == TaskMode::Recurring {
            title.push('↻');
            title.push(' ');
        }
        title.push_str(&task.title);
        let mut title_cell = Cell::new(title);
        if completed {
            title_cell = title_cell
                .add_attribute(Attribute::CrossedOut)
                .fg(Color::DarkGrey);
        }
        row.add_cell(title_cell);

        row.add_cell(Cell::new(recurrence_label(task)));
        row.add_cell(due_cell(task.effective_due_at(), completed));
        row.add_cell(if completed {
            Cell::new("Completed").fg(Color::Green)
        } else {
            Cell::new("Pending")
        });
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_task_detail(task: &Task) {
    let mut table = Table::new();
    table.add_row(vec![Cell::new("ID").add_attribute(Attribute::Bold), Cell::new(task.id)]);
    table.add_row(vec![Cell::new("Title").add_attribute(Attribute::Bold), Cell::new(&task.title)]);
    table.add_row(vec![
        Cell::new("Description").add_attribute(Attribute::Bold),
        Cell::new(task.description.as_deref().unwrap_or("None")),
    ]);
    table.add_row(vec![Cell::new("Project").add_attribute(Attribute::Bold), Cell::new(task.project_id)]);
    table.add_row(vec![
        Cell::new("Mode").add_attribute(Attribute::Bold),
        Cell::new(format!("{:?}", task.mode())),
    ]);

    match task.mode() {
        TaskMode::Recurring => {
            table.add_row(vec![
                Cell::new("Repeats").add_attribute(Attribute::Bold),
                Cell::new(recurrence_label(task)),
            ]);
            table.add_row(vec![
                Cell::new("Series start").add_attribute(Attribute::Bold),
                due_cell(task.recurrence_start_at, false),
            ]);
            table.add_row(vec![
                Cell::new("Next due").add_attribute(Attribute::Bold),
                due_cell(task.next_due_at, false),
            ]);
        }
        TaskMode::Normal => {
            let completed = task.completed_at.is_some();
            table.add_row(vec![
                Cell::new("Due").add_attribute(Attribute::Bold),
                due_cell(task.due_at, completed),
            ]);
            table.add_row(vec![
                Cell::new("Completed").add_attribute(Attribute::Bold),
                Cell::new(
                    task.completed_at
                        .map(|c| c.humanize())
                        .unwrap_or_else(|| "No".to_string()),
                ),
            ]);
        }
    }

    println!("{table}");
}

pub fn display_occurrences(occurrences: &[Occurrence]) {
    if occurrences.is_empty() {
        println!("No occurrences found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Due", "Status"]);

    for occurrence in occurrences {
        let completed = occurrence.is_completed();
        table.add_row(vec![
            Cell::new(occurrence.id),
            due_cell(Some(occurrence.due_at), completed),
            if completed {
                Cell::new("Completed").fg(Color::Green)
            } else {
                Cell::new("Pending")
            },
        ]);
    }

    println!("{table}");
}

pub fn display_agenda(items: &[AgendaItem]) {
    if items.is_empty() {
        println!("Nothing due.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Due", "Title", "Task", "Occurrence"]);

    for item in items {
        let title = match item.kind {
            AgendaItemKind::Occurrence => format!("↻ {}", item.title),
            AgendaItemKind::Task => item.title.clone(),
        };
        table.add_row(vec![
            due_cell(Some(item.due_at), false),
            Cell::new(title),
            Cell::new(short_id(&item.task_id)),
            Cell::new(
                item.occurrence_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }

    println!("{table}");
}
