//! Main window view.
//!
//! Before the engine is ready the window only offers the load button.
//! Afterwards it shows the picker, the status line and the result.

use iced::alignment::{Horizontal, Vertical};
use iced::widget::{button, column, container, row, text, Column};
use iced::{Element, Length};

use vidshrink_core::session::SessionState;

use crate::app::{App, Message};
use crate::theme::{colors, font, spacing};

/// Build the main window view.
pub fn view(app: &App) -> Element<'_, Message> {
    let page = if app.session.is_ready() {
        transcoder_page(app)
    } else {
        load_page(app)
    };

    container(page)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .padding(spacing::LG)
        .into()
}

/// Load button, with progress and load errors underneath.
fn load_page(app: &App) -> Element<'_, Message> {
    let state = app.session.state();
    let label = if state.is_loading() {
        "Loading..."
    } else {
        "Load engine"
    };

    let load_button = button(text(label).size(font::NORMAL))
        .on_press_maybe(state.can_load().then_some(Message::LoadEngine))
        .padding([spacing::SM, spacing::XL]);

    let mut content = Column::new()
        .push(load_button)
        .spacing(spacing::SM)
        .align_x(Horizontal::Center);

    if state.is_loading() {
        content = content.push(status_line(app));
    }
    if let Some(failure) = state.failure() {
        content = content.push(error_text(failure.to_string()));
    }

    content.into()
}

/// Picker, status line and result controls.
fn transcoder_page(app: &App) -> Element<'_, Message> {
    let state = app.session.state();

    let header = text("Video Transcoder").size(font::HEADER);

    let selected = app
        .session
        .selected()
        .and_then(|f| f.name())
        .map(|name| name.into_owned())
        .unwrap_or_else(|| "No file chosen".to_string());

    let picker = row![
        button(text("Choose video").size(font::NORMAL))
            .on_press(Message::PickFile)
            .padding([spacing::XS, spacing::MD]),
        text(selected).size(font::NORMAL),
    ]
    .spacing(spacing::SM)
    .align_y(Vertical::Center);

    let mut content = column![header, picker]
        .spacing(spacing::MD)
        .width(Length::Fill)
        .max_width(520.0)
        .align_x(Horizontal::Center);

    if app.session.artifact().is_some() {
        content = content.push(result_controls());
    }

    match state {
        SessionState::Failed(failure) => content = content.push(error_text(failure.to_string())),
        _ => content = content.push(status_line(app)),
    }

    match &app.notice {
        Some(Ok(notice)) => content = content.push(text(notice).size(font::SM).color(colors::SUCCESS)),
        Some(Err(problem)) => content = content.push(error_text(problem.clone())),
        None => {}
    }

    content.into()
}

fn result_controls<'a>() -> Element<'a, Message> {
    row![
        button(text("Preview").size(font::NORMAL))
            .on_press(Message::Preview)
            .padding([spacing::XS, spacing::MD]),
        button(text("Download Converted Video").size(font::NORMAL))
            .on_press(Message::Download)
            .padding([spacing::XS, spacing::MD]),
    ]
    .spacing(spacing::SM)
    .into()
}

fn status_line(app: &App) -> Element<'_, Message> {
    text(app.status.current().unwrap_or_default())
        .size(font::SM)
        .color(colors::TEXT_SECONDARY)
        .into()
}

fn error_text<'a>(message: String) -> Element<'a, Message> {
    text(message).size(font::SM).color(colors::ERROR).into()
}
