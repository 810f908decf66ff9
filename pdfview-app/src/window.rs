use std::path::PathBuf;
use std::time::{Duration, Instant};

use egui::{Align2, Context, Key, TextEdit, ViewportCommand};
use pdfview_core::{Command, Controller, FitMode, ViewerEvent};
use pdfview_ui::{Canvas, EventMapper, Overscroll, ScrollAnchor, StatusBar, UiEvent};
use tracing::{debug, info};

use crate::APP_NAME;

/// How long the page-turn notice stays in the status bar.
const NOTICE_TIMEOUT: Duration = Duration::from_secs(2);

struct ErrorDialog {
    title: String,
    message: String,
}

#[derive(Default)]
struct GotoDialog {
    input: String,
    focus_requested: bool,
}

pub struct ViewerApp {
    controller: Controller,
    canvas: Canvas,
    status: StatusBar,
    mapper: EventMapper,
    search_query: String,
    focus_search: bool,
    page_input: String,
    goto_dialog: Option<GotoDialog>,
    error_dialog: Option<ErrorDialog>,
    anchor: ScrollAnchor,
    viewport: (f32, f32),
}

impl ViewerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        controller: Controller,
        startup_file: Option<PathBuf>,
    ) -> Self {
        // Ctrl+Plus/Minus/0 belong to the page zoom, not the UI scale.
        cc.egui_ctx
            .options_mut(|options| options.zoom_with_keyboard = false);

        let mapper = EventMapper::new(controller.config().scroll_step);
        let mut app = Self {
            controller,
            canvas: Canvas::new(),
            status: StatusBar::new(),
            mapper,
            search_query: String::new(),
            focus_search: false,
            page_input: String::new(),
            goto_dialog: None,
            error_dialog: None,
            anchor: ScrollAnchor::Top,
            viewport: (0.0, 0.0),
        };
        if let Some(path) = startup_file {
            app.dispatch(&cc.egui_ctx, Command::Open { path });
        }
        app
    }

    fn dispatch(&mut self, ctx: &Context, command: Command) {
        let anchor = anchor_for(&command);
        self.dispatch_anchored(ctx, command, anchor);
    }

    fn dispatch_anchored(&mut self, ctx: &Context, command: Command, anchor: ScrollAnchor) {
        self.anchor = anchor;
        self.controller.apply(command);
        self.drain_events(ctx);
    }

    fn drain_events(&mut self, ctx: &Context) {
        for event in self.controller.take_events() {
            match event {
                ViewerEvent::DocumentOpened(file) => {
                    info!(file = %file.name, "document shown");
                    self.search_query.clear();
                    ctx.send_viewport_cmd(ViewportCommand::Title(format!(
                        "{APP_NAME} - {}",
                        file.name
                    )));
                }
                ViewerEvent::DocumentClosed => {
                    self.canvas.clear();
                    self.search_query.clear();
                    self.page_input.clear();
                    ctx.send_viewport_cmd(ViewportCommand::Title(APP_NAME.to_string()));
                }
                ViewerEvent::PageRendered { image, highlights } => {
                    self.canvas.display(ctx, image, self.anchor);
                    if !highlights.is_empty() {
                        self.canvas.set_highlights(ctx, &highlights);
                    }
                }
                ViewerEvent::HighlightsChanged(highlights) => {
                    self.canvas.set_highlights(ctx, &highlights);
                }
                ViewerEvent::StatusChanged(snapshot) => {
                    self.page_input = if snapshot.page_count == 0 {
                        String::new()
                    } else {
                        snapshot.page.to_string()
                    };
                    self.status.set_snapshot(snapshot);
                }
                ViewerEvent::Message(message) => self.status.set_message(message),
                ViewerEvent::Error { title, message } => {
                    self.status.set_message(message.clone());
                    self.error_dialog = Some(ErrorDialog { title, message });
                }
            }
        }
        self.anchor = ScrollAnchor::Keep;
    }

    fn handle_ui_event(&mut self, ctx: &Context, event: UiEvent) {
        match event {
            UiEvent::Command(command) => self.dispatch(ctx, command),
            UiEvent::Open => self.open_dialog(ctx),
            UiEvent::OpenGotoDialog => {
                if self.controller.has_document() {
                    self.goto_dialog = Some(GotoDialog::default());
                }
            }
            UiEvent::FocusSearch => self.focus_search = true,
            UiEvent::Scroll { dx, dy } => {
                let overscroll = self.canvas.scroll(dx, dy);
                self.turn_page_on_overscroll(ctx, overscroll);
            }
            UiEvent::Quit => ctx.send_viewport_cmd(ViewportCommand::Close),
            UiEvent::None => {}
        }
    }

    fn handle_keyboard(&mut self, ctx: &Context) {
        if self.goto_dialog.is_some() || self.error_dialog.is_some() {
            return;
        }
        if ctx.wants_keyboard_input() {
            return;
        }
        let events = ctx.input(|input| self.mapper.map_events(&input.events));
        for event in events {
            self.handle_ui_event(ctx, event);
        }
    }

    fn open_dialog(&mut self, ctx: &Context) {
        let picked = rfd::FileDialog::new()
            .add_filter("PDF", &["pdf"])
            .set_title("Open PDF")
            .pick_file();
        match picked {
            Some(path) => self.dispatch(ctx, Command::Open { path }),
            None => debug!("open dialog cancelled"),
        }
    }

    fn turn_page_on_overscroll(&mut self, ctx: &Context, overscroll: Overscroll) {
        let can_go = (self.controller.can_go_previous(), self.controller.can_go_next());
        let Some((command, anchor, notice)) = page_turn(overscroll, can_go) else {
            return;
        };
        self.dispatch_anchored(ctx, command, anchor);
        self.status.set_transient_message(notice, Instant::now() + NOTICE_TIMEOUT);
    }

    fn expire_status_message(&mut self, ctx: &Context) {
        let now = Instant::now();
        self.status.expire(now);
        if let Some(deadline) = self.status.message_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }

    fn draw_menu(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open…").clicked() {
                        ui.close_menu();
                        self.open_dialog(ctx);
                    }
                    if ui
                        .add_enabled(self.controller.has_document(), egui::Button::new("Close"))
                        .clicked()
                    {
                        ui.close_menu();
                        self.dispatch(ctx, Command::Close);
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(ViewportCommand::Close);
                    }
                });
            });
        });
    }

    fn draw_toolbar(&mut self, ctx: &Context) {
        let mut commands = Vec::new();
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("📂 Open").clicked() {
                    self.focus_search = false;
                    commands.push(UiEvent::Open);
                }
                ui.separator();

                let has_document = self.controller.has_document();
                ui.add_enabled_ui(has_document, |ui| {
                    let can_prev = self.controller.can_go_previous();
                    let can_next = self.controller.can_go_next();
                    if ui.add_enabled(can_prev, egui::Button::new("⏮")).clicked() {
                        commands.push(UiEvent::Command(Command::FirstPage));
                    }
                    if ui.add_enabled(can_prev, egui::Button::new("◀")).clicked() {
                        commands.push(UiEvent::Command(Command::PrevPage));
                    }

                    let page_edit = ui.add(
                        TextEdit::singleline(&mut self.page_input)
                            .desired_width(40.0)
                            .horizontal_align(egui::Align::Center),
                    );
                    if page_edit.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter)) {
                        match parse_page_number(&self.page_input) {
                            Some(page) => {
                                commands.push(UiEvent::Command(Command::GotoPage { page }))
                            }
                            None => self.status.set_message("Invalid page number"),
                        }
                    }
                    ui.label(format!("/ {}", self.controller.page_count()));

                    if ui.add_enabled(can_next, egui::Button::new("▶")).clicked() {
                        commands.push(UiEvent::Command(Command::NextPage));
                    }
                    if ui.add_enabled(can_next, egui::Button::new("⏭")).clicked() {
                        commands.push(UiEvent::Command(Command::LastPage));
                    }
                    ui.separator();

                    if ui.button("−").on_hover_text("Zoom out").clicked() {
                        commands.push(UiEvent::Command(Command::ZoomOut));
                    }
                    if ui.button("+").on_hover_text("Zoom in").clicked() {
                        commands.push(UiEvent::Command(Command::ZoomIn));
                    }
                    if ui.button("100%").on_hover_text("Actual size").clicked() {
                        commands.push(UiEvent::Command(Command::ResetZoom));
                    }
                    ui.separator();

                    let current_mode = self.controller.state().fit_mode;
                    for mode in [FitMode::FitWidth, FitMode::FitHeight, FitMode::FitPage] {
                        if ui.selectable_label(current_mode == mode, mode.label()).clicked() {
                            commands.push(UiEvent::Command(Command::SetFitMode { mode }));
                        }
                    }
                    ui.separator();

                    if ui.button("⟳").on_hover_text("Rotate clockwise").clicked() {
                        commands.push(UiEvent::Command(Command::Rotate));
                    }
                    ui.separator();

                    let search = ui.add(
                        TextEdit::singleline(&mut self.search_query)
                            .hint_text("Search")
                            .desired_width(160.0),
                    );
                    if self.focus_search {
                        search.request_focus();
                        self.focus_search = false;
                    }
                    if search.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter)) {
                        commands.push(UiEvent::Command(Command::Search {
                            query: self.search_query.clone(),
                        }));
                    }
                    if ui.button("▲").on_hover_text("Previous match").clicked() {
                        commands.push(UiEvent::Command(Command::SearchPrev));
                    }
                    if ui.button("▼").on_hover_text("Next match").clicked() {
                        commands.push(UiEvent::Command(Command::SearchNext));
                    }
                });
            });
        });
        for event in commands {
            self.handle_ui_event(ctx, event);
        }
    }

    fn draw_status_bar(&mut self, ctx: &Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for section in self.status.sections() {
                    ui.label(section);
                    ui.separator();
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(self.status.message());
                });
            });
        });
    }

    fn draw_canvas(&mut self, ctx: &Context) {
        let response = egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.canvas.show(ui))
            .inner;

        let viewport = (response.viewport.x, response.viewport.y);
        if viewport_changed(self.viewport, viewport) {
            self.viewport = viewport;
            self.dispatch(
                ctx,
                Command::Resize {
                    width: viewport.0,
                    height: viewport.1,
                },
            );
        }
        self.turn_page_on_overscroll(ctx, response.overscroll);
    }

    fn draw_goto_dialog(&mut self, ctx: &Context) {
        let Some(dialog) = self.goto_dialog.as_mut() else {
            return;
        };
        let page_count = self.controller.page_count();
        let mut submit = false;
        let mut cancel = false;
        egui::Window::new("Go to Page")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!("Page number (1-{page_count}):"));
                let edit = ui.text_edit_singleline(&mut dialog.input);
                if !dialog.focus_requested {
                    edit.request_focus();
                    dialog.focus_requested = true;
                }
                if edit.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter)) {
                    submit = true;
                }
                ui.horizontal(|ui| {
                    submit |= ui.button("Go").clicked();
                    cancel |= ui.button("Cancel").clicked();
                });
                cancel |= ui.input(|input| input.key_pressed(Key::Escape));
            });

        if submit {
            let parsed = parse_page_number(&dialog.input);
            self.goto_dialog = None;
            match parsed {
                Some(page) => self.dispatch(ctx, Command::GotoPage { page }),
                None => self.status.set_message("Invalid page number"),
            }
        } else if cancel {
            self.goto_dialog = None;
        }
    }

    fn draw_error_dialog(&mut self, ctx: &Context) {
        let Some(dialog) = self.error_dialog.as_ref() else {
            return;
        };
        let mut close = false;
        egui::Window::new(dialog.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(dialog.message.as_str());
                ui.add_space(8.0);
                close = ui.button("OK").clicked()
                    || ui.input(|input| {
                        input.key_pressed(Key::Escape) || input.key_pressed(Key::Enter)
                    });
            });
        if close {
            self.error_dialog = None;
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.handle_keyboard(ctx);
        self.draw_menu(ctx);
        self.draw_toolbar(ctx);
        self.expire_status_message(ctx);
        self.draw_status_bar(ctx);
        self.draw_canvas(ctx);
        self.draw_goto_dialog(ctx);
        self.draw_error_dialog(ctx);
    }
}

/// Page changes start at the top of the new page; everything else keeps
/// the scroll position.
fn anchor_for(command: &Command) -> ScrollAnchor {
    match command {
        Command::Open { .. }
        | Command::NextPage
        | Command::PrevPage
        | Command::FirstPage
        | Command::LastPage
        | Command::GotoPage { .. } => ScrollAnchor::Top,
        _ => ScrollAnchor::Keep,
    }
}

/// Command for a scroll past the page edge, if there is a page to turn to.
fn page_turn(
    overscroll: Overscroll,
    (can_go_previous, can_go_next): (bool, bool),
) -> Option<(Command, ScrollAnchor, &'static str)> {
    match overscroll {
        Overscroll::PastEnd if can_go_next => {
            Some((Command::NextPage, ScrollAnchor::Top, "Next page"))
        }
        Overscroll::PastStart if can_go_previous => {
            Some((Command::PrevPage, ScrollAnchor::Bottom, "Previous page"))
        }
        _ => None,
    }
}

/// Parses a 1-based page number typed by the user into a page index.
fn parse_page_number(input: &str) -> Option<usize> {
    input
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|page| page.checked_sub(1))
}

fn viewport_changed(old: (f32, f32), new: (f32, f32)) -> bool {
    let moved = (old.0 - new.0).abs() >= 1.0 || (old.1 - new.1).abs() >= 1.0;
    new.0 >= 1.0 && new.1 >= 1.0 && moved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_number_is_one_based() {
        assert_eq!(parse_page_number("1"), Some(0));
        assert_eq!(parse_page_number(" 12 "), Some(11));
        assert_eq!(parse_page_number("0"), None);
        assert_eq!(parse_page_number("-3"), None);
        assert_eq!(parse_page_number("two"), None);
    }

    #[test]
    fn navigation_commands_scroll_to_the_top() {
        assert_eq!(anchor_for(&Command::NextPage), ScrollAnchor::Top);
        assert_eq!(anchor_for(&Command::GotoPage { page: 4 }), ScrollAnchor::Top);
        assert_eq!(anchor_for(&Command::ZoomIn), ScrollAnchor::Keep);
        assert_eq!(anchor_for(&Command::Rotate), ScrollAnchor::Keep);
    }

    #[test]
    fn scrolling_past_an_edge_turns_one_page_when_possible() {
        assert_eq!(
            page_turn(Overscroll::PastEnd, (false, true)),
            Some((Command::NextPage, ScrollAnchor::Top, "Next page"))
        );
        assert_eq!(
            page_turn(Overscroll::PastStart, (true, false)),
            Some((Command::PrevPage, ScrollAnchor::Bottom, "Previous page"))
        );
        assert_eq!(page_turn(Overscroll::PastEnd, (true, false)), None);
        assert_eq!(page_turn(Overscroll::PastStart, (false, true)), None);
        assert_eq!(page_turn(Overscroll::None, (true, true)), None);
    }

    #[test]
    fn viewport_change_ignores_subpixel_jitter_and_empty_sizes() {
        assert!(viewport_changed((0.0, 0.0), (800.0, 600.0)));
        assert!(!viewport_changed((800.0, 600.0), (800.4, 600.2)));
        assert!(viewport_changed((800.0, 600.0), (820.0, 600.0)));
        assert!(!viewport_changed((800.0, 600.0), (0.0, 0.0)));
    }
}
