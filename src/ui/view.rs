//! Widget tree for the main window

use iced::widget::{
    button, checkbox, column, container, image, pick_list, progress_bar, row, scrollable, slider,
    text, text_input, Column, Row,
};
use iced::{Alignment, Element, Length};

use super::{App, Message};
use crate::layout::PageSize;
use crate::sequence::{ImageEntry, Sequence, MAX_SEQUENCES};
use crate::settings::{ThemeMode, MAX_MARGIN_MM, MAX_QUALITY, MIN_QUALITY};

const CARD_WIDTH: f32 = 176.0;
const PANEL_WIDTH: f32 = 300.0;

pub fn view(app: &App) -> Element<'_, Message> {
    let main: Element<'_, Message> = if app.show_about {
        about()
    } else {
        row![workspace_area(app), settings_panel(app)]
            .spacing(12)
            .height(Length::Fill)
            .into()
    };

    column![toolbar(app), sequence_tabs(app), main]
        .spacing(12)
        .padding(12)
        .into()
}

fn toolbar(app: &App) -> Element<'_, Message> {
    let tail = &app.settings.tail_page;
    let tail_label = match &tail.path {
        Some(path) => format!(
            "Tail page: {}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        ),
        None => "Tail page".to_string(),
    };
    let busy = app.is_generating();

    let mut tail_checkbox = checkbox(tail.enabled).label(tail_label);
    let mut choose = button(text("Choose...").size(14));
    if !busy {
        tail_checkbox = tail_checkbox.on_toggle(Message::TailPageToggled);
        choose = choose.on_press(Message::ChooseTailPage);
    }

    let about_label = if app.show_about { "Back" } else { "About" };

    row![
        text("MangaPDF").size(22),
        container(
            row![tail_checkbox, choose]
                .spacing(8)
                .align_y(Alignment::Center)
        )
        .width(Length::Fill)
        .center_x(Length::Fill),
        text("Theme").size(14),
        pick_list(
            &ThemeMode::ALL[..],
            Some(app.settings.general.theme),
            Message::ThemeSelected
        ),
        button(text(about_label).size(14)).on_press(Message::ToggleAbout),
    ]
    .spacing(12)
    .align_y(Alignment::Center)
    .into()
}

fn sequence_tabs(app: &App) -> Element<'_, Message> {
    let workspace = &app.workspace;
    let current = workspace.current_id();
    let busy = app.is_generating();
    let can_delete = workspace.len() > 1 && !busy;

    let mut tabs = Row::new().spacing(6).align_y(Alignment::Center);
    for sequence in workspace.sequences() {
        let label = format!("{} ({})", sequence.name(), sequence.len());
        let style = if sequence.id() == current {
            button::primary
        } else {
            button::secondary
        };
        let mut tab = row![button(text(label).size(14))
            .style(style)
            .on_press(Message::SelectSequence(sequence.id()))]
        .spacing(2);
        if can_delete {
            tab = tab.push(
                button(text("x").size(14))
                    .style(button::danger)
                    .on_press(Message::RemoveSequence(sequence.id())),
            );
        }
        tabs = tabs.push(tab);
    }

    let mut add = button(text("+ New sequence").size(14));
    if workspace.can_add_sequence() && !busy {
        add = add.on_press(Message::AddSequence);
    }
    tabs = tabs.push(add).push(
        text(format!("{}/{}", workspace.len(), MAX_SEQUENCES))
            .size(12),
    );

    tabs.into()
}

fn workspace_area(app: &App) -> Element<'_, Message> {
    let sequence = app.workspace.current();
    let busy = app.is_generating();

    let hint = if app.is_loading() {
        "Loading images...".to_string()
    } else {
        "Drop images here or click to browse (JPG, PNG, WEBP)".to_string()
    };
    let mut drop_zone = button(
        container(text(hint).size(16))
            .center_x(Length::Fill)
            .padding(24),
    )
    .width(Length::Fill)
    .style(button::secondary);
    if !busy {
        drop_zone = drop_zone.on_press(Message::PickImages);
    }

    let mut sort = button(text("Sort by name").size(14));
    let mut clear = button(text("Clear all").size(14)).style(button::danger);
    if !busy && !sequence.is_empty() {
        sort = sort.on_press(Message::SortByName);
        clear = clear.on_press(Message::ClearAll);
    }

    let header = row![
        container(text(format!("{}: {} images", sequence.name(), sequence.len())).size(16))
            .width(Length::Fill),
        sort,
        clear
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    column![drop_zone, header, thumbnail_grid(app, sequence)]
        .spacing(10)
        .width(Length::Fill)
        .into()
}

fn thumbnail_grid<'a>(app: &'a App, sequence: &'a Sequence) -> Element<'a, Message> {
    if sequence.is_empty() {
        return container(text("No images yet").size(14))
            .center(Length::Fill)
            .into();
    }

    let last = sequence.len() - 1;
    let busy = app.is_generating();
    let cards = sequence
        .images()
        .iter()
        .enumerate()
        .map(|(index, entry)| thumbnail_card(app, entry, index, last, busy));

    scrollable(
        Row::with_children(cards)
            .spacing(10)
            .wrap()
            .vertical_spacing(10),
    )
    .height(Length::Fill)
    .into()
}

fn thumbnail_card<'a>(
    app: &'a App,
    entry: &'a ImageEntry,
    index: usize,
    last: usize,
    busy: bool,
) -> Element<'a, Message> {
    let preview: Element<'a, Message> = match app.thumbnails.get(&entry.id) {
        Some(handle) => image(handle.clone()).width(Length::Fill).into(),
        None => container(text("no preview").size(12))
            .center_x(Length::Fill)
            .height(Length::Fixed(120.0))
            .into(),
    };

    let mut info = row![text(format!("{}x{}", entry.width, entry.height)).size(12)].spacing(6);
    if entry.is_long_strip() {
        info = info.push(container(text("LONG").size(11)).padding([1, 4]).style(container::rounded_box));
    }

    let mut left = button(text("<").size(12));
    let mut right = button(text(">").size(12));
    let mut remove = button(text("Remove").size(12)).style(button::danger);
    if !busy {
        if index > 0 {
            left = left.on_press(Message::MoveImage(entry.id, -1));
        }
        if index < last {
            right = right.on_press(Message::MoveImage(entry.id, 1));
        }
        remove = remove.on_press(Message::RemoveImage(entry.id));
    }

    let card = Column::new()
        .spacing(4)
        .push(text(format!("{}", index + 1)).size(11))
        .push(preview)
        .push(info)
        .push(text(entry.display_name()).size(12))
        .push(row![left, right, remove].spacing(4));

    container(card)
        .padding(6)
        .width(Length::Fixed(CARD_WIDTH))
        .style(container::rounded_box)
        .into()
}

fn settings_panel(app: &App) -> Element<'_, Message> {
    let sequence = app.workspace.current();
    let output = &app.settings.output;
    let busy = app.is_generating();

    let pages = app.page_count();

    let mut add = button(text("Add images").size(14)).width(Length::Fill);
    let mut generate = button(text("Generate current").size(14))
        .width(Length::Fill)
        .style(button::success);
    let batch_count = app.workspace.non_empty().count();
    let mut generate_all = button(text(format!("Generate all ({batch_count})")).size(14))
        .width(Length::Fill);
    if !busy {
        add = add.on_press(Message::PickImages);
        if !sequence.is_empty() {
            generate = generate.on_press(Message::GenerateCurrent);
        }
        if batch_count > 0 {
            generate_all = generate_all.on_press(Message::GenerateAll);
        }
    }

    let margin_enabled = output.page_size != PageSize::Original;
    let margin_label = if margin_enabled {
        format!("Margin: {} mm", output.margin_mm)
    } else {
        "Margin: not used with original size".to_string()
    };

    let mut name_input = text_input("Output name", app.name_field()).padding(6);
    if !busy {
        name_input = name_input.on_input(Message::NameChanged);
    }

    let progress = app.generation.map(|g| g.fraction).unwrap_or(0.0);

    let trailer_label = match sequence.trailer() {
        Some(path) => format!(
            "Tail page: {}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        ),
        None if app.settings.default_trailer().is_some() => "Tail page: global".to_string(),
        None => "Tail page: none".to_string(),
    };
    let mut choose_trailer = button(text("Choose...").size(12));
    let mut clear_trailer = button(text("Clear").size(12));
    if !busy {
        choose_trailer = choose_trailer.on_press(Message::ChooseSequenceTrailer);
        if sequence.trailer().is_some() {
            clear_trailer = clear_trailer.on_press(Message::ClearSequenceTrailer);
        }
    }

    let panel = column![
        text("Output").size(18),
        text(format!("Pages: {pages}")).size(14),
        add,
        text("Page size").size(14),
        pick_list(
            &PageSize::ALL[..],
            Some(output.page_size),
            Message::PageSizeSelected
        )
        .width(Length::Fill),
        text(margin_label).size(14),
        slider(0.0..=MAX_MARGIN_MM, output.margin_mm, Message::MarginChanged).step(1.0),
        text(format!("JPEG quality: {}", output.quality)).size(14),
        slider(
            f32::from(MIN_QUALITY)..=f32::from(MAX_QUALITY),
            f32::from(output.quality),
            Message::QualityChanged
        )
        .step(1.0),
        text("File name").size(14),
        name_input,
        text(trailer_label).size(14),
        row![choose_trailer, clear_trailer].spacing(6),
        generate,
        generate_all,
        progress_bar(0.0..=1.0, progress),
        text(&app.status).size(12),
    ]
    .spacing(8);

    container(scrollable(panel))
        .padding(10)
        .width(Length::Fixed(PANEL_WIDTH))
        .height(Length::Fill)
        .style(container::rounded_box)
        .into()
}

fn about<'a>() -> Element<'a, Message> {
    let body = column![
        text("MangaPDF").size(28),
        text(format!("Version {}", env!("CARGO_PKG_VERSION"))).size(14),
        text("Merge JPG, PNG and WEBP images into PDF files.").size(14),
        text("Up to five sequences can be prepared at once, each written to its own PDF with an optional tail page.").size(14),
        text("Settings are stored in settings.toml in the user configuration directory.").size(12),
    ]
    .spacing(10)
    .align_x(Alignment::Center);

    container(body).center(Length::Fill).into()
}
