// SPDX-License-Identifier: GPL-3.0-only

//! Fixed text layout of the dashlet surface.

use crate::snapshot::{RangeKey, Snapshot};
use cosmic::{
    iced::{Alignment, Background, Color, Font, Length},
    iced_widget::{column, container, row},
    theme,
    widget::{horizontal_space, text},
    Element,
};

pub const WINDOW_WIDTH: f32 = 300.0;
pub const WINDOW_HEIGHT: f32 = 70.0;

const BACKGROUND: Color = Color::from_rgba(0.2, 0.2, 0.2, 0.5);
const HEADER_COLOR: Color = Color::WHITE;
const ROW_COLOR: Color = Color::from_rgb(0.9, 0.9, 0.9);
const FONT_SIZE: u16 = 11;
const ROW_INDENT: f32 = 6.0;

/// What the surface shows on the next paint.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Profile name followed by the today, yesterday and week rows.
    Data([String; 4]),
    /// No snapshot yet: a title and a status line.
    Placeholder { title: String, status: String },
}

fn label(key: RangeKey) -> &'static str {
    match key {
        RangeKey::Today => "Today     ",
        RangeKey::Yesterday => "Yesterday ",
        RangeKey::Week => "Last 7days",
    }
}

fn row_line(snapshot: &Snapshot, key: RangeKey, currency: &str) -> String {
    let report = snapshot.get(key);
    format!(
        "{} {:>6} Views {:03.2} {}",
        label(key),
        report.views,
        report.revenue,
        currency
    )
}

/// The four lines drawn for `snapshot`, header first.
pub fn lines(snapshot: &Snapshot, currency: &str) -> [String; 4] {
    [
        snapshot.profile_name().to_string(),
        row_line(snapshot, RangeKey::Today, currency),
        row_line(snapshot, RangeKey::Yesterday, currency),
        row_line(snapshot, RangeKey::Week, currency),
    ]
}

fn line<'a, M: 'a>(content: String, color: Color) -> Element<'a, M> {
    text(content)
        .size(FONT_SIZE)
        .font(Font::MONOSPACE)
        .class(theme::Text::Color(color))
        .into()
}

fn indented<'a, M: 'a>(content: String) -> Element<'a, M> {
    row![
        horizontal_space().width(Length::Fixed(ROW_INDENT)),
        line(content, ROW_COLOR),
    ]
    .align_y(Alignment::Center)
    .into()
}

/// Dark translucent panel with the frame's lines on it.
pub fn surface<'a, M: 'a>(frame: Frame) -> Element<'a, M> {
    let content = match frame {
        Frame::Data([header, today, yesterday, week]) => column![
            line(header, HEADER_COLOR),
            indented(today),
            indented(yesterday),
            indented(week),
        ],
        Frame::Placeholder { title, status } => column![line(title, HEADER_COLOR), indented(status)],
    };

    container(content.spacing(2))
        .padding([6, 12])
        .width(Length::Fill)
        .height(Length::Fill)
        .class(theme::Container::custom(|_theme| container::Style {
            background: Some(Background::Color(BACKGROUND)),
            ..Default::default()
        }))
        .into()
}
