// app.rs

use std::fs;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use trisk_map::filter::{CascadeOptions, Reconciled};
use trisk_map::html::write_html;
use trisk_map::{AppContext, Metric, RenderOutcome, Selection, SelectionField, render_selection};

#[derive(PartialEq)]
pub enum CurrentScreen {
    Dashboard,
    Help,
}

/// Focusable controls in the selection column, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Metric,
    Field(SelectionField),
    HoverFields,
}

pub const WIDGETS: [Widget; 7] = [
    Widget::Metric,
    Widget::Field(SelectionField::BaselineScenario),
    Widget::Field(SelectionField::TargetScenario),
    Widget::Field(SelectionField::Technology),
    Widget::Field(SelectionField::Year),
    Widget::Field(SelectionField::ShockYear),
    Widget::HoverFields,
];

pub struct App {
    pub current_screen: CurrentScreen,
    pub context: AppContext,

    // Selection state
    pub selection: Selection,
    pub options: CascadeOptions,
    pub metric: Metric,
    pub metric_order: Vec<Metric>,
    pub hover_fields: Vec<Metric>,
    pub hover_cursor: usize,
    pub focus: usize, // Index into WIDGETS

    // Last render
    pub outcome: Option<RenderOutcome>,

    // UI related
    pub notification: String,
    pub help_keybinds: Vec<String>,
    pub output_dir: PathBuf,
    pub quit: bool,
}

impl App {
    /// Loads both tables and renders the default selection. Load failures are fatal.
    pub fn new(context: AppContext, output_dir: PathBuf) -> trisk_map::Result<App> {
        let metric_order = context.config().metric_order();
        let metric = metric_order
            .first()
            .copied()
            .unwrap_or(Metric::ProductionPlanCompanyTechnology);
        let mut app = App {
            current_screen: CurrentScreen::Dashboard,
            context,

            selection: Selection::default(),
            options: CascadeOptions::default(),
            metric,
            metric_order,
            hover_fields: vec![metric],
            hover_cursor: 0,
            focus: 0,

            outcome: None,

            notification: String::from("Choose a metric, scenarios, technology and year."),
            help_keybinds: vec![
                "J/K or Up/Down: Move between selectors".to_string(),
                "H/L or Left/Right: Change the focused value".to_string(),
                "Space: Toggle hover field (on Hover data)".to_string(),
                "E: Export PNG, HTML and GeoJSON".to_string(),
                "R: Clear cache and reload data files".to_string(),
                "?: Show Help screen".to_string(),
                "Q or Ctrl-C: Quit the application".to_string(),
            ],
            output_dir,
            quit: false,
        };
        app.recompute()?;
        Ok(app)
    }

    pub fn focused(&self) -> Widget {
        WIDGETS[self.focus]
    }

    /// Reconciles the selection, then reruns filter, join and render.
    /// Returns the fields the reconciliation changed.
    pub fn recompute(&mut self) -> trisk_map::Result<Vec<SelectionField>> {
        let (assets, boundaries) = self.context.load()?;
        let Reconciled { options, changed } = self.selection.reconcile_options(&assets);
        self.options = options;
        self.outcome = Some(render_selection(
            &assets,
            &boundaries,
            self.context.config(),
            &self.selection,
            self.metric,
            &self.hover_fields,
        ));
        Ok(changed)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> trisk_map::Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return Ok(());
        }
        if self.current_screen == CurrentScreen::Help {
            self.current_screen = CurrentScreen::Dashboard;
            return Ok(());
        }
        match key.code {
            KeyCode::Char('q') => {
                self.quit = true;
                self.notification = String::from("Exiting...");
            }
            KeyCode::Char('?') => self.current_screen = CurrentScreen::Help,
            KeyCode::Char('j') | KeyCode::Down => self.focus = (self.focus + 1) % WIDGETS.len(),
            KeyCode::Char('k') | KeyCode::Up => {
                self.focus = (self.focus + WIDGETS.len() - 1) % WIDGETS.len()
            }
            KeyCode::Char('l') | KeyCode::Right => self.cycle(1)?,
            KeyCode::Char('h') | KeyCode::Left => self.cycle(-1)?,
            KeyCode::Char(' ') if self.focused() == Widget::HoverFields => self.toggle_hover()?,
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('r') => self.reload()?,
            _ => {}
        }
        Ok(())
    }

    fn cycle(&mut self, step: isize) -> trisk_map::Result<()> {
        match self.focused() {
            Widget::Metric => {
                let idx = self.metric_order.iter().position(|m| *m == self.metric).unwrap_or(0);
                self.metric = self.metric_order[wrap(idx, step, self.metric_order.len())];
                self.notification = format!("Weighting by {}", self.metric);
                self.recompute()?;
                Ok(())
            }
            Widget::Field(field) => {
                let options = self.options.get(field);
                if options.is_empty() {
                    self.notification = format!("No {} available.", field.label());
                    return Ok(());
                }
                let current = self.selection.get(field);
                let idx = options
                    .iter()
                    .position(|o| Some(o) == current.as_ref())
                    .unwrap_or(0);
                let value = options[wrap(idx, step, options.len())].clone();
                self.selection.set(field, Some(value.clone()));
                let changed = self.recompute()?;
                let downstream: Vec<&str> = changed
                    .iter()
                    .filter(|f| **f != field)
                    .map(|f| f.label())
                    .collect();
                self.notification = if downstream.is_empty() {
                    format!("{} set to {}", field.label(), value)
                } else {
                    format!(
                        "{} set to {}; reset {}",
                        field.label(),
                        value,
                        downstream.join(", ")
                    )
                };
                Ok(())
            }
            Widget::HoverFields => {
                if !self.metric_order.is_empty() {
                    self.hover_cursor = wrap(self.hover_cursor, step, self.metric_order.len());
                }
                Ok(())
            }
        }
    }

    fn toggle_hover(&mut self) -> trisk_map::Result<()> {
        let Some(&metric) = self.metric_order.get(self.hover_cursor) else {
            return Ok(());
        };
        if let Some(pos) = self.hover_fields.iter().position(|m| *m == metric) {
            self.hover_fields.remove(pos);
            self.notification = format!("Removed {metric} from hover data");
        } else {
            self.hover_fields.push(metric);
            let order = &self.metric_order;
            self.hover_fields
                .sort_by_key(|m| order.iter().position(|o| o == m).unwrap_or(usize::MAX));
            self.notification = format!("Added {metric} to hover data");
        }
        self.recompute()?;
        Ok(())
    }

    fn reload(&mut self) -> trisk_map::Result<()> {
        self.context.invalidate();
        self.recompute()?;
        let rows = self.context.assets()?.len();
        self.notification = format!("Reloaded {rows} asset rows.");
        Ok(())
    }

    /// Writes the current map as PNG, HTML and GeoJSON. Failures only update the notification.
    fn export(&mut self) {
        let Some(outcome) = &self.outcome else {
            self.notification = String::from("Nothing to export yet.");
            return;
        };
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let stem = format!("trisk-{}-{stamp}", self.metric);
        match export_artifacts(&outcome.artifact, &self.output_dir, &stem) {
            Ok(()) => {
                info!(%stem, dir = %self.output_dir.display(), "exported map");
                self.notification = format!(
                    "Exported {stem}.png/.html/.geojson to {}",
                    self.output_dir.display()
                );
            }
            Err(err) => {
                warn!("export failed: {err}");
                self.notification = format!("Export failed: {err}");
            }
        }
    }
}

pub fn export_artifacts(
    artifact: &trisk_map::MapArtifact,
    dir: &Path,
    stem: &str,
) -> trisk_map::Result<()> {
    fs::create_dir_all(dir).map_err(|source| trisk_map::TriskError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    artifact.write_png(&dir.join(format!("{stem}.png")))?;
    write_html(artifact, &dir.join(format!("{stem}.html")))?;
    artifact.write_geojson(&dir.join(format!("{stem}.geojson")))
}

fn wrap(idx: usize, step: isize, len: usize) -> usize {
    (idx as isize + step).rem_euclid(len.max(1) as isize) as usize
}
