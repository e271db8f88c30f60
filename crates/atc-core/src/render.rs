//! Rendering dispatch
//!
//! A ready message is handed to a caption sink (the on-screen ATC display)
//! and/or a voice engine. Both are external collaborators reached through
//! traits. A voice failure never aborts the station: voice is switched off
//! for that station and the message is captioned instead.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::error::VoiceError;

/// Messages quieter than this are not rendered at all
pub const MIN_AUDIBLE_VOLUME: f64 = 0.05;

/// Text returned for a message code a station does not recognise
pub const FALLBACK_TEXT: &str = "Station calling, say again.";

/// A caption shown on the ATC display
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    /// Station identifier that produced the message
    pub source: String,
    /// Message text
    pub text: String,
    /// Broadcast that repeats until cancelled (ATIS/AWOS)
    pub repeating: bool,
}

/// Receives captions for display
pub trait CaptionSink: Send {
    /// Show a caption
    fn show(&mut self, caption: &Caption);

    /// Remove any repeating caption from `source`
    fn clear(&mut self, _source: &str) {}
}

/// Caption sink that records captions in shared memory
///
/// Clones share the same log, so one handle can be given to a station and
/// another kept by the UI (or a test) to read what was shown.
#[derive(Debug, Clone, Default)]
pub struct CaptionLog {
    captions: Arc<Mutex<Vec<Caption>>>,
}

impl CaptionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every caption shown so far
    pub fn captions(&self) -> Vec<Caption> {
        self.captions
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Text of every caption shown so far
    pub fn texts(&self) -> Vec<String> {
        self.captions().into_iter().map(|c| c.text).collect()
    }

    /// Take and clear the log
    pub fn drain(&self) -> Vec<Caption> {
        self.captions
            .lock()
            .map(|mut c| std::mem::take(&mut *c))
            .unwrap_or_default()
    }
}

impl CaptionSink for CaptionLog {
    fn show(&mut self, caption: &Caption) {
        if let Ok(mut captions) = self.captions.lock() {
            captions.push(caption.clone());
        }
    }
}

/// Speech synthesis and playback
pub trait VoiceEngine: Send {
    /// Start speaking `text` under `audio_ref`
    ///
    /// Returns the playback length in seconds. `repeating` asks for the
    /// message to loop until [`VoiceEngine::stop`] is called.
    fn speak(
        &mut self,
        audio_ref: &str,
        text: &str,
        volume: f64,
        repeating: bool,
    ) -> Result<f64, VoiceError>;

    /// Stop and discard the sample playing under `audio_ref`
    fn stop(&mut self, audio_ref: &str);
}

/// What a call to [`RenderDispatch::present`] actually did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Presentation {
    /// A caption was shown
    pub captioned: bool,
    /// Audio started; holds the engine's reported length
    pub voiced: Option<f64>,
}

impl Presentation {
    pub fn is_silent(&self) -> bool {
        !self.captioned && self.voiced.is_none()
    }
}

/// Routes messages to the caption sink and the voice engine
pub struct RenderDispatch {
    display: bool,
    voice: bool,
    voice_ok: bool,
    captions: Option<Box<dyn CaptionSink>>,
    engine: Option<Box<dyn VoiceEngine>>,
    playing: HashSet<String>,
}

impl std::fmt::Debug for RenderDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderDispatch")
            .field("display", &self.display)
            .field("voice", &self.voice)
            .field("voice_ok", &self.voice_ok)
            .field("has_captions", &self.captions.is_some())
            .field("has_engine", &self.engine.is_some())
            .field("playing", &self.playing)
            .finish()
    }
}

impl RenderDispatch {
    /// Dispatch with no sinks attached
    pub fn new(display: bool, voice: bool) -> Self {
        Self {
            display,
            voice,
            voice_ok: true,
            captions: None,
            engine: None,
            playing: HashSet::new(),
        }
    }

    /// Attach the caption sink
    pub fn set_caption_sink(&mut self, sink: Box<dyn CaptionSink>) {
        self.captions = Some(sink);
    }

    /// Attach the voice engine
    pub fn set_voice_engine(&mut self, engine: Box<dyn VoiceEngine>) {
        self.engine = Some(engine);
        self.voice_ok = true;
    }

    /// Output captions for this station
    pub fn set_display(&mut self, display: bool) {
        self.display = display;
    }

    pub fn display(&self) -> bool {
        self.display
    }

    /// Use voice for this station when an engine is attached
    pub fn set_voice(&mut self, voice: bool) {
        self.voice = voice;
    }

    /// Whether voice is enabled, attached and has not failed
    pub fn voice_available(&self) -> bool {
        self.voice && self.voice_ok && self.engine.is_some()
    }

    /// Whether audio is playing under `audio_ref`
    pub fn is_playing(&self, audio_ref: &str) -> bool {
        self.playing.contains(audio_ref)
    }

    /// Present a message
    ///
    /// An empty `audio_ref` means caption only.
    pub fn present(
        &mut self,
        source: &str,
        message: &str,
        volume: f64,
        audio_ref: &str,
        repeating: bool,
    ) -> Presentation {
        let mut outcome = Presentation::default();

        if volume < MIN_AUDIBLE_VOLUME {
            debug!("{}: volume {:.2} below audible threshold", source, volume);
            self.cancel(audio_ref);
            return outcome;
        }

        if self.voice_available() && !audio_ref.is_empty() {
            // Replaying under a live reference restarts the sample
            self.cancel(audio_ref);
            if let Some(engine) = self.engine.as_mut() {
                match engine.speak(audio_ref, message, volume, repeating) {
                    Ok(length) => {
                        self.playing.insert(audio_ref.to_string());
                        outcome.voiced = Some(length);
                    }
                    Err(e) => {
                        warn!("{}: voice disabled after failure: {}", source, e);
                        self.voice_ok = false;
                    }
                }
            }
        }

        // Captions are the fallback whenever voice did not happen
        if self.display || (self.voice && outcome.voiced.is_none()) {
            if let Some(sink) = self.captions.as_mut() {
                sink.show(&Caption {
                    source: source.to_string(),
                    text: message.to_string(),
                    repeating,
                });
                outcome.captioned = true;
            }
        }

        if outcome.is_silent() {
            debug!("{}: nothing rendered for {:?}", source, message);
        }
        outcome
    }

    /// Stop the audio playing under `audio_ref`
    ///
    /// Returns false, doing nothing, if that reference is not playing.
    pub fn cancel(&mut self, audio_ref: &str) -> bool {
        if !self.playing.remove(audio_ref) {
            return false;
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.stop(audio_ref);
        }
        info!("Stopped audio {}", audio_ref);
        true
    }

    /// Stop a repeating broadcast and clear its caption
    pub fn cancel_broadcast(&mut self, source: &str, audio_ref: &str) {
        self.cancel(audio_ref);
        if let Some(sink) = self.captions.as_mut() {
            sink.clear(source);
        }
    }
}

/// Fields substituted into message templates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextContext {
    /// Aircraft being addressed
    pub callsign: String,
    /// Station name, as spoken
    pub station: String,
    /// Station identifier
    pub ident: String,
    /// Formatted frequency, e.g. "120.500"
    pub frequency: String,
    /// Additional `{key}` substitutions
    pub extra: Vec<(String, String)>,
}

impl TextContext {
    /// Add an extra substitution
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }
}

/// Substitute `{callsign}`, `{station}`, `{ident}`, `{frequency}` and any
/// extra keys into `template`
///
/// Unknown placeholders are left as written.
pub fn render_template(template: &str, ctx: &TextContext) -> String {
    let mut text = template
        .replace("{callsign}", &ctx.callsign)
        .replace("{station}", &ctx.station)
        .replace("{ident}", &ctx.ident)
        .replace("{frequency}", &ctx.frequency);
    for (key, value) in &ctx.extra {
        text = text.replace(&format!("{{{key}}}"), value);
    }
    text
}

/// Message templates keyed by an integer code
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    templates: HashMap<i32, String>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, replacing any previous one for `code`
    pub fn insert(&mut self, code: i32, template: impl Into<String>) {
        self.templates.insert(code, template.into());
    }

    pub fn contains(&self, code: i32) -> bool {
        self.templates.contains_key(&code)
    }

    /// Render the template for `code`, or [`FALLBACK_TEXT`] if there is none
    pub fn gen_text(&self, code: i32, ctx: &TextContext) -> String {
        match self.templates.get(&code) {
            Some(template) => render_template(template, ctx),
            None => {
                warn!("No message template for code {}", code);
                FALLBACK_TEXT.to_string()
            }
        }
    }
}

impl<S: Into<String>> FromIterator<(i32, S)> for MessageCatalog {
    fn from_iter<I: IntoIterator<Item = (i32, S)>>(iter: I) -> Self {
        Self {
            templates: iter.into_iter().map(|(c, t)| (c, t.into())).collect(),
        }
    }
}
