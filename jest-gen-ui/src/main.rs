use std::time::Duration;

use eframe::{egui, Frame};
use egui::Context;

use reqwest::blocking::Client;
use reqwest::Result;
use serde::{Deserialize, Serialize};

const BASE_URL: &str = "http://127.0.0.1:5000";

/// Body returned by `GET /v1/sentence`.
#[derive(Deserialize)]
struct SentenceBody {
    sentence: String,
}

/// Body returned by the server on failure.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Body sent to `POST /v1/sentence`.
#[derive(Serialize)]
struct LabeledSentence<'a> {
    sentence: &'a str,
    was_funny: bool,
}

/// Counters returned after a label is recorded.
#[derive(Deserialize)]
struct StatusBody {
    states: usize,
    num_funny: usize,
    num_not_funny: usize,
}

/// REST context holding a reusable blocking HTTP client.
struct RESTContext {
    client: Client,
}

impl RESTContext {
    /// Creates a new REST context with a timeout.
    ///
    /// Generation may retry thousands of candidates, hence the long timeout.
    fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::new(30, 0))
            .build()?;
        Ok(Self { client })
    }

    /// Sends a GET request to `/v1/sentence` with query parameters.
    ///
    /// Returns the server error message as `Err` text when generation fails.
    fn get_sentence(&self, params: &[(String, String)]) -> Result<std::result::Result<String, String>> {
        let response = self.client
            .get(format!("{BASE_URL}/v1/sentence"))
            .query(params)
            .send()?;

        if response.status().is_success() {
            Ok(Ok(response.json::<SentenceBody>()?.sentence))
        } else {
            Ok(Err(response.json::<ErrorBody>()?.error))
        }
    }

    /// Sends a POST request to `/v1/sentence` with the user's judgment.
    fn post_label(&self, sentence: &str, was_funny: bool) -> Result<StatusBody> {
        self.client
            .post(format!("{BASE_URL}/v1/sentence"))
            .json(&LabeledSentence { sentence, was_funny })
            .send()?
            .error_for_status()?
            .json()
    }
}

/// Global UI state (MUST persist between frames in egui).
struct LabelingUI {
    rest: RESTContext,
    last_sentence: Option<String>,
    message: String,

    nb_try: usize,
    use_seed: bool,
    seed: String,
}

impl LabelingUI {
    /// Initializes the UI with sane defaults.
    fn new() -> Result<Self> {
        Ok(Self {
            rest: RESTContext::new()?,
            last_sentence: None,
            message: "Click Generate to start".to_owned(),

            nb_try: 10_000,
            use_seed: true,
            seed: "I".to_owned(),
        })
    }

    /// Builds the query parameters for the API.
    ///
    /// The seed is only sent when enabled and not blank.
    fn build_query(&self) -> Vec<(String, String)> {
        let mut params = vec![("nb_try".to_owned(), self.nb_try.to_string())];
        if self.use_seed && !self.seed.trim().is_empty() {
            params.push(("seed".to_owned(), self.seed.trim().to_owned()));
        }
        params
    }

    /// Performs the generation request.
    fn get_sentence(&mut self) {
        match self.rest.get_sentence(&self.build_query()) {
            Ok(Ok(sentence)) => {
                self.last_sentence = Some(sentence);
                self.message.clear();
            }
            Ok(Err(error)) => {
                self.last_sentence = None;
                self.message = error;
            }
            Err(e) => {
                self.last_sentence = None;
                self.message = format!("Error: {e}");
            }
        }
    }

    /// Sends the label for the current sentence, then fetches the next one.
    fn post_label(&mut self, was_funny: bool) {
        let Some(sentence) = self.last_sentence.take() else {
            return;
        };
        match self.rest.post_label(&sentence, was_funny) {
            Ok(status) => {
                self.get_sentence();
                self.message = format!(
                    "{} states, {} funny / {} not funny examples",
                    status.states, status.num_funny, status.num_not_funny
                );
            }
            Err(e) => {
                self.last_sentence = Some(sentence);
                self.message = format!("Error: {e}");
            }
        }
    }
}

impl eframe::App for LabelingUI {
    /// UI update loop (called every frame).
    fn update(&mut self, ctx: &Context, _: &mut Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {

            egui::Grid::new("labeling_grid")
                .num_columns(2)
                .spacing([20.0, 6.0])
                .striped(true)
                .show(ui, |ui| {

                    // nb_try
                    ui.label("Number of tries");
                    ui.add(
                        egui::DragValue::new(&mut self.nb_try)
                            .range(1..=100_000)
                            .speed(10),
                    );
                    ui.end_row();

                    // seed checkbox + word
                    ui.checkbox(&mut self.use_seed, "Start with word");
                    if self.use_seed {
                        ui.text_edit_singleline(&mut self.seed);
                    } else {
                        ui.label("Random first word");
                    }
                    ui.end_row();

                    ui.separator();
                    ui.end_row();

                    // Generate button
                    if ui
                        .add_sized([200.0, 40.0], egui::Button::new("Generate"))
                        .clicked()
                    {
                        self.get_sentence();
                    }

                    // Output
                    match &self.last_sentence {
                        Some(sentence) => ui.label(sentence),
                        None => ui.label("No sentence"),
                    };
                    ui.end_row();
                });

            ui.separator();

            // Labels are only offered for a sentence that is on screen
            ui.add_enabled_ui(self.last_sentence.is_some(), |ui| {
                ui.horizontal(|ui| {
                    if ui.add_sized([140.0, 40.0], egui::Button::new("Funny")).clicked() {
                        self.post_label(true);
                    }
                    if ui.add_sized([140.0, 40.0], egui::Button::new("Not funny")).clicked() {
                        self.post_label(false);
                    }
                });
            });

            if !self.message.is_empty() {
                ui.label(&self.message);
            }
        });
    }
}

/// Application entry point.
fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 260.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "jest-gen",
        options,
        Box::new(|_| Ok(Box::new(LabelingUI::new()?))),
    )
}
