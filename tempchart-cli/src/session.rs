use anyhow::Result;
use inquire::{InquireError, Select, Text};
use std::fmt;
use tempchart_core::{ChartPage, HistoryView, Phase, RangeSpec};

use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    ChangeCity,
    ChangeDays,
    Refresh,
    ViewPastData,
    Quit,
}

impl Action {
    /// Menu entries for the current phase; past data only makes sense after a success.
    fn menu(phase: Phase) -> Vec<Action> {
        let mut actions = vec![Action::ChangeCity, Action::ChangeDays, Action::Refresh];
        if phase == Phase::Success {
            actions.push(Action::ViewPastData);
        }
        actions.push(Action::Quit);
        actions
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::ChangeCity => "Change city",
            Action::ChangeDays => "Change day count",
            Action::Refresh => "Refresh",
            Action::ViewPastData => "View past data",
            Action::Quit => "Quit",
        })
    }
}

/// `None` when the user backs out of a prompt (Esc / Ctrl-C).
fn answered<T>(res: Result<T, InquireError>) -> Result<Option<T>> {
    match res {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub async fn run(mut page: ChartPage) -> Result<()> {
    println!("{}", render::LOADING);
    page.mount().await;
    let mut redraw = true;

    loop {
        if redraw {
            println!("{}", render::chart_view(page.state()));
        }
        redraw = true;

        let menu = Action::menu(page.state().phase());
        let Some(action) = answered(Select::new("What next?", menu).prompt())? else {
            break;
        };

        match action {
            Action::ChangeCity => {
                let current = page.state().city.clone();
                let Some(city) = answered(
                    Text::new("City:")
                        .with_initial_value(&current)
                        .with_help_message("Leave blank to use your current position")
                        .prompt(),
                )?
                else {
                    redraw = false;
                    continue;
                };

                println!("{}", render::LOADING);
                page.set_city(city.trim()).await;
            }
            Action::ChangeDays => {
                let choices = RangeSpec::DAY_COUNT_CHOICES.to_vec();
                let Some(days) = answered(Select::new("Days:", choices).prompt())? else {
                    redraw = false;
                    continue;
                };

                println!("{}", render::LOADING);
                page.set_range(RangeSpec::LastDays(days)).await;
            }
            Action::Refresh => {
                println!("{}", render::LOADING);
                page.refresh().await;
            }
            Action::ViewPastData => {
                let view = HistoryView::from_navigation(page.view_history().as_ref());
                println!("{}", render::history_view(&view));
                redraw = false;
            }
            Action::Quit => break,
        }
    }

    Ok(())
}
