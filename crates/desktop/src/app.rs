//! Seeker Desktop — egui app state and UI.

use eframe::egui;
use lib::api::ChatClient;
use lib::{ChatView, Message};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock};

const CHAT_INPUT_HEIGHT: f32 = 96.0;
const CHAT_MESSAGES_MIN_HEIGHT: f32 = 80.0;
const LOG_BUFFER_MAX_LINES: usize = 2000;

/// Ring buffer of log lines for the Logs screen. Written by DesktopLogger.
static LOG_LINES: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();

fn log_buffer() -> &'static Mutex<VecDeque<String>> {
    LOG_LINES.get_or_init(|| Mutex::new(VecDeque::new()))
}

fn push_log_line(line: String) {
    if let Ok(mut buf) = log_buffer().lock() {
        buf.push_back(line);
        while buf.len() > LOG_BUFFER_MAX_LINES {
            buf.pop_front();
        }
    }
}

/// Logger that appends to LOG_LINES for display in the Logs screen. Failed chat requests land here.
struct DesktopLogger;

impl log::Log for DesktopLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let line = format!(
            "{} [{}] {}",
            clock_time(),
            record.level(),
            record.args()
        );
        push_log_line(line);
    }

    fn flush(&self) {}
}

/// UTC wall-clock time of day (hh:mm:ss.mmm) for log lines.
fn clock_time() -> String {
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = t.as_secs();
    let millis = t.subsec_millis();
    let h = (secs / 3600) % 24;
    let m = (secs / 60) % 60;
    let s = secs % 60;
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, millis)
}

static LOGGER: DesktopLogger = DesktopLogger;

#[derive(Clone, Copy, PartialEq, Eq, Default)]
enum Screen {
    #[default]
    Chat,
    Logs,
}

pub struct SeekerApp {
    /// Runs chat requests. Held so the ChatView's handle stays valid for the app's lifetime.
    _runtime: tokio::runtime::Runtime,
    chat: ChatView,
    /// Resolved POST URL, shown under the Chat heading.
    endpoint_url: String,
    /// Config load failure, if any (defaults are used instead).
    config_error: Option<String>,
    current_screen: Screen,
}

impl SeekerApp {
    /// Space between the main screen title (Chat, Logs) and the content below.
    const SCREEN_TITLE_BOTTOM_SPACING: f32 = 18.0;
    /// Space between the bottom of the content and the window edge.
    const SCREEN_FOOTER_SPACING: f32 = 24.0;

    pub fn new(cc: &eframe::CreationContext<'_>, runtime: tokio::runtime::Runtime) -> Self {
        let _ = LOG_LINES.get_or_init(|| Mutex::new(VecDeque::new()));
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Debug);
        log::info!("desktop started");

        let (config, config_error) = match lib::config::load_config(None) {
            Ok((config, path)) => {
                log::info!("loaded config from {}", path.display());
                (config, None)
            }
            Err(e) => {
                log::error!("failed to load config: {:#}", e);
                (
                    lib::config::Config::default(),
                    Some(format!("failed to load config: {:#}", e)),
                )
            }
        };
        let endpoint = lib::config::resolve_endpoint(&config, None);
        let client = ChatClient::from_config(&endpoint).unwrap_or_else(|e| {
            log::warn!("failed to build configured client ({}); using defaults", e);
            ChatClient::new(&endpoint.base_url)
        });
        let endpoint_url = client.url().to_string();
        log::info!("posting chat messages to {}", endpoint_url);

        let ctx = cc.egui_ctx.clone();
        let chat = ChatView::new(Arc::new(client), runtime.handle().clone())
            .with_notify(move || ctx.request_repaint());

        Self {
            _runtime: runtime,
            chat,
            endpoint_url,
            config_error,
            current_screen: Screen::default(),
        }
    }

    /// Renders a single chat message: frame, author-based fill, content.
    fn render_chat_message(ui: &mut egui::Ui, m: &Message) {
        let frame = egui::Frame::none()
            .fill(if m.is_user {
                ui.style().visuals.extreme_bg_color
            } else {
                ui.style().visuals.panel_fill
            })
            .stroke(egui::Stroke::new(
                1.0,
                ui.style().visuals.widgets.noninteractive.bg_stroke.color,
            ))
            .rounding(egui::Rounding::same(8.0))
            .inner_margin(egui::Margin::same(8.0));

        frame.show(ui, |ui| {
            if m.is_user {
                ui.label(egui::RichText::new(&m.text).strong());
            } else {
                ui.label(&m.text);
            }
        });
    }

    /// Render the chat UI (messages + input). Messages fill the space above a fixed input area.
    /// The input stays enabled while replies are outstanding.
    fn ui_chat(&mut self, ui: &mut egui::Ui) {
        let row_height = ui.spacing().interact_size.y + 8.0;
        let bottom_section_height =
            CHAT_INPUT_HEIGHT + 8.0 + row_height + Self::SCREEN_FOOTER_SPACING;
        let messages_height =
            (ui.available_height() - bottom_section_height).max(CHAT_MESSAGES_MIN_HEIGHT);

        egui::ScrollArea::vertical()
            .max_height(messages_height)
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for m in self.chat.messages() {
                    Self::render_chat_message(ui, m);
                    ui.add_space(8.0);
                }
                if self.chat.messages().is_empty() {
                    ui.label("No messages yet.");
                }
            });

        ui.add_space(8.0);
        let response = ui.add_sized(
            [ui.available_width(), CHAT_INPUT_HEIGHT],
            egui::TextEdit::multiline(self.chat.draft_input_mut()).hint_text("Type a message"),
        );
        ui.add_space(8.0);

        let mut send_now = false;
        ui.horizontal(|ui| {
            if ui.button("Send").clicked() {
                send_now = true;
            }
            ui.label(
                egui::RichText::new("Ctrl+Enter to send")
                    .small()
                    .color(ui.style().visuals.weak_text_color()),
            );
        });
        if response.has_focus() {
            let (modifiers, enter) = ui.input(|i| (i.modifiers, i.key_pressed(egui::Key::Enter)));
            if (modifiers.command || modifiers.ctrl) && enter {
                send_now = true;
            }
        }
        if send_now {
            self.chat.submit();
            response.request_focus();
        }
        ui.add_space(Self::SCREEN_FOOTER_SPACING);
    }

    fn ui_logs_screen(&self, ui: &mut egui::Ui) {
        ui.add_space(24.0);
        ui.heading("Logs");
        ui.add_space(Self::SCREEN_TITLE_BOTTOM_SPACING);

        let lines: Vec<String> = log_buffer()
            .lock()
            .map(|b| b.iter().cloned().collect())
            .unwrap_or_default();

        let available = ui.available_height();
        let scroll_height = (available - Self::SCREEN_FOOTER_SPACING).max(0.0);
        egui::ScrollArea::vertical()
            .max_height(scroll_height)
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in &lines {
                    ui.label(
                        egui::RichText::new(line.as_str()).family(egui::FontFamily::Monospace),
                    );
                }
                if lines.is_empty() {
                    ui.label("No log output yet.");
                }
            });
        ui.add_space(Self::SCREEN_FOOTER_SPACING);
    }
}

impl eframe::App for SeekerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.chat.poll();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            egui::Frame::none()
                .inner_margin(egui::Margin::symmetric(24.0, 0.0))
                .show(ui, |ui| {
                    ui.add_space(16.0);
                    ui.heading("Seeker");
                    ui.add_space(16.0);
                });
        });

        let current_screen = &mut self.current_screen;
        egui::SidePanel::left("sidebar")
            .resizable(false)
            .exact_width(140.0)
            .show(ctx, |ui| {
                egui::Frame::none()
                    .inner_margin(egui::Margin::symmetric(24.0, 0.0))
                    .show(ui, |ui| {
                        ui.add_space(24.0);
                        if ui.selectable_label(*current_screen == Screen::Chat, "Chat").clicked() {
                            *current_screen = Screen::Chat;
                        }
                        ui.add_space(12.0);
                        if ui.selectable_label(*current_screen == Screen::Logs, "Logs").clicked() {
                            *current_screen = Screen::Logs;
                        }
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::Frame::none()
                .inner_margin(egui::Margin::symmetric(24.0, 0.0))
                .show(ui, |ui| match self.current_screen {
                    Screen::Chat => {
                        ui.add_space(24.0);
                        ui.heading("Chat");
                        ui.label(
                            egui::RichText::new(&self.endpoint_url)
                                .small()
                                .color(ui.style().visuals.weak_text_color()),
                        );
                        if let Some(ref err) = self.config_error {
                            ui.colored_label(egui::Color32::RED, err);
                        }
                        ui.add_space(Self::SCREEN_TITLE_BOTTOM_SPACING);
                        self.ui_chat(ui);
                    }
                    Screen::Logs => self.ui_logs_screen(ui),
                });
        });
    }
}
