use eframe::egui;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, warn};

use crate::audio::{self, AudioBuffer, SymphoniaDecoder};
use crate::catalog::{ListSelection, MemoryCatalog};
use crate::config::Settings;
use crate::player::RodioPlayer;
use crate::playhead::{self, CursorHint};
use crate::render::{RenderOutcome, Viewport};
use crate::{Player, SampleCatalog, WaveformEvent, WaveformView};

const WAVEFORM_HEIGHT: f32 = 180.0;
const PLAYHEAD_TICK: Duration = Duration::from_millis(16);
const AUDIO_EXTENSIONS: &[&str] = &["wav", "aif", "aiff", "flac", "mp3", "ogg", "m4a"];

type BrowserView = WaveformView<MemoryCatalog, RodioPlayer, ListSelection>;

pub fn run(files: Vec<PathBuf>, settings: Settings) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 600.0])
            .with_min_inner_size([640.0, 360.0]),
        ..Default::default()
    };
    eframe::run_native(
        "loopscope",
        options,
        Box::new(move |cc| {
            configure_visuals(&cc.egui_ctx);
            Ok(Box::new(BrowserApp::new(files, settings, cc.egui_ctx.clone())))
        }),
    ).map_err(|e| anyhow::anyhow!("GUI Error: {}", e))
}

pub fn configure_visuals(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.window_corner_radius = egui::CornerRadius::same(8);
    visuals.widgets.noninteractive.bg_fill = egui::Color32::from_gray(20);
    ctx.set_visuals(visuals);
}

enum AppMessage {
    Decoded(String, AudioBuffer),
    Error(String),
}

pub struct BrowserApp {
    view: BrowserView,
    settings: Settings,
    events: Receiver<WaveformEvent>,
    msg_receiver: Receiver<AppMessage>,
    msg_sender: Sender<AppMessage>,
    ctx: egui::Context,

    // UI State
    status: String,
    volume: f32,
    waveform_texture: Option<egui::TextureHandle>,
}

impl BrowserApp {
    pub fn new(files: Vec<PathBuf>, settings: Settings, ctx: egui::Context) -> Self {
        let (msg_sender, msg_receiver) = unbounded();
        let (event_sender, events) = unbounded();

        let view = WaveformView::new(
            MemoryCatalog::new(),
            RodioPlayer::new(settings.volume),
            ListSelection::default(),
            Box::new(SymphoniaDecoder),
            &settings,
            event_sender,
        );

        let mut app = Self {
            view,
            volume: settings.volume,
            settings,
            events,
            msg_receiver,
            msg_sender,
            ctx,
            status: String::new(),
            waveform_texture: None,
        };
        app.add_files(files);
        app
    }

    fn add_files(&mut self, files: Vec<PathBuf>) {
        let mut first = None;
        for path in files {
            match self.view.catalog_mut().add_file(&path) {
                Ok(name) => {
                    first.get_or_insert(name);
                }
                Err(e) => {
                    warn!("skipping {}: {e}", path.display());
                    self.status = format!("Could not open {}: {e}", path.display());
                }
            }
        }
        if self.view.active_sample().is_none() {
            if let Some(name) = first {
                self.select(name);
            }
        }
    }

    fn select(&mut self, name: String) {
        if self.view.active_sample() == Some(name.as_str()) {
            return;
        }
        self.view.player_mut().unload();
        self.view.selection_mut().select(Some(name.clone()));
        self.view.sync_selection();

        let Some(path) = self.view.catalog().path_of(&name) else {
            return;
        };
        let sender = self.msg_sender.clone();
        let ctx = self.ctx.clone();

        thread::spawn(move || {
            match audio::load_audio_file(&path) {
                Ok(data) => {
                    sender.send(AppMessage::Decoded(name, data)).ok();
                }
                Err(e) => {
                    sender.send(AppMessage::Error(e.to_string())).ok();
                }
            }
            ctx.request_repaint();
        });
    }

    fn pick_files(&mut self) {
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("Audio", AUDIO_EXTENSIONS)
            .pick_files()
        {
            self.add_files(paths);
        }
    }

    fn drain_messages(&mut self) {
        while let Ok(msg) = self.msg_receiver.try_recv() {
            match msg {
                AppMessage::Decoded(name, data) => {
                    // A slow decode may land after the user moved on.
                    if self.view.active_sample() == Some(name.as_str()) {
                        self.view.player_mut().load_buffer(data);
                    }
                }
                AppMessage::Error(e) => {
                    self.status = format!("Error: {}", e);
                }
            }
        }

        while let Ok(event) = self.events.try_recv() {
            match event {
                WaveformEvent::StatusMessage(text) => self.status = text,
                WaveformEvent::LoopPointsUpdated { a_ms, b_ms } => {
                    self.status = format!("Loop {:.0}ms to {:.0}ms", a_ms, b_ms);
                }
                WaveformEvent::SeekRequested(ms) => debug!("seek requested to {ms:.0}ms"),
            }
        }
    }

    fn sample_list(&mut self, ui: &mut egui::Ui) {
        let names: Vec<String> = self.view.catalog().names().map(str::to_owned).collect();
        let mut clicked = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for name in &names {
                let selected = self.view.active_sample() == Some(name.as_str());
                if ui.selectable_label(selected, name).clicked() {
                    clicked = Some(name.clone());
                }
            }
        });
        if let Some(name) = clicked {
            self.select(name);
        }
    }

    fn transport_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let has_sample = self.view.active_sample().is_some();
            if ui.add_enabled(has_sample, egui::Button::new("Play")).clicked() {
                self.view.player_mut().play();
            }
            if ui.add_enabled(has_sample, egui::Button::new("Stop")).clicked() {
                self.view.stop();
            }
            ui.separator();
            ui.label("Volume");
            if ui.add(egui::Slider::new(&mut self.volume, 0.0..=1.0)).changed() {
                self.view.player_mut().set_volume(self.volume);
            }
            if let Some(points) = self.view.loop_points() {
                ui.separator();
                ui.label(format!("A {:.0}ms  B {:.0}ms", points.a_ms, points.b_ms));
            }
        });
    }

    fn waveform(&mut self, ui: &mut egui::Ui) {
        let size = egui::vec2(ui.available_width(), WAVEFORM_HEIGHT);
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
        let ctx = ui.ctx().clone();

        self.view.set_viewport(Viewport::new(rect.width() as u32, rect.height() as u32));
        match self.view.ensure_rendered(Instant::now()) {
            RenderOutcome::Rebuilt => self.upload_bitmap(&ctx),
            RenderOutcome::Pending => ctx.request_repaint_after(self.settings.resize_debounce()),
            RenderOutcome::Blank => self.waveform_texture = None,
            RenderOutcome::Fresh => {}
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 4.0, egui::Color32::from_gray(14));
        if let Some(texture) = &self.waveform_texture {
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            painter.image(texture.id(), rect, uv, egui::Color32::WHITE);
        }

        self.handle_pointer(ui, rect);
        self.paint_overlays(&painter, rect);

        let hover = response
            .hover_pos()
            .filter(|_| !self.view.capture().is_captured())
            .map(|pos| self.view.hover(to_local(rect, pos)));
        let hint = if self.view.selector().is_selecting() {
            Some(CursorHint::Text)
        } else {
            hover
        };
        match hint {
            Some(CursorHint::Grab) => ctx.set_cursor_icon(egui::CursorIcon::Grab),
            Some(CursorHint::Text) => ctx.set_cursor_icon(egui::CursorIcon::Text),
            _ => {}
        }

        if self.view.player().is_playing() {
            ctx.request_repaint_after(PLAYHEAD_TICK);
        }
    }

    fn handle_pointer(&mut self, ui: &egui::Ui, rect: egui::Rect) {
        let (modifiers, pressed, released, pointer) = ui.input(|i| {
            (
                i.modifiers,
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
            )
        });
        self.view.modifier_changed(self.settings.loop_modifier.is_held(&modifiers));

        let Some(pos) = pointer else {
            return;
        };
        let local = to_local(rect, pos);
        if pressed && rect.contains(pos) {
            self.view.pointer_down(local);
        }
        if self.view.capture().is_captured() {
            self.view.pointer_moved(local);
        }
        if released {
            self.view.pointer_up(local);
        }
    }

    fn paint_overlays(&self, painter: &egui::Painter, rect: egui::Rect) {
        let colour = self.settings.selection_colour();
        let selector = self.view.selector();

        if let Some((left, right)) = selector.selected_band() {
            let band = egui::Rect::from_x_y_ranges(
                (rect.left() + left)..=(rect.left() + right),
                rect.y_range(),
            );
            painter.rect_filled(band, 0.0, colour.gamma_multiply(0.25));
            painter.rect_stroke(band, 0.0, egui::Stroke::new(1.0, colour), egui::StrokeKind::Inside);
        }
        if let Some(drag) = selector.drag_rect() {
            let drag = drag.translate(rect.min.to_vec2());
            painter.rect_filled(drag, 0.0, colour.gamma_multiply(0.15));
        }
        if let Some(x) = self.view.playhead_x() {
            playhead::paint_playhead(painter, rect, x, self.settings.playhead_colour());
        }
    }

    fn upload_bitmap(&mut self, ctx: &egui::Context) {
        let Some(image) = self.view.cache().bitmap().cloned() else {
            self.waveform_texture = None;
            return;
        };
        match &mut self.waveform_texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.waveform_texture = Some(ctx.load_texture("waveform", image, egui::TextureOptions::LINEAR));
            }
        }
    }
}

fn to_local(rect: egui::Rect, pos: egui::Pos2) -> egui::Pos2 {
    (pos - rect.min).to_pos2()
}

impl eframe::App for BrowserApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_messages();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("loopscope").strong().color(egui::Color32::from_gray(100)));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Open files...").clicked() {
                        self.pick_files();
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::SidePanel::left("samples").resizable(true).show(ctx, |ui| {
            self.sample_list(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.view.catalog().is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.label(egui::RichText::new("Drag & Drop Audio Files Here").heading().color(egui::Color32::GRAY));
                });
            } else {
                self.waveform(ui);
                ui.add_space(8.0);
                self.transport_controls(ui);
            }
        });

        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw.dropped_files.iter().filter_map(|file| file.path.clone()).collect()
        });
        if !dropped.is_empty() {
            self.add_files(dropped);
        }
    }
}
