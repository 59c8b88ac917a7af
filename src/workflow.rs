//! The pin studio: editor state, the generation state machine and export.
//!
//! ```text
//! Idle ──generate──▶ CheckingCredential ──▶ AwaitingGeneration ──▶ Succeeded
//!   ▲     (HD only, no credential)            │                     │
//!   │                                          └────────▶ Failed ◀───┘ (next attempt)
//!   └──────────────────────── reset ───────────────────────────────────
//! ```
//!
//! A generation is split into [`PinStudio::begin_generation`],
//! [`PinStudio::select_credential`] and [`PinStudio::complete_generation`]
//! so an event loop can interleave other input while the provider call is
//! outstanding. [`PinStudio::generate`] runs all three in order.

use crate::catalog::{CreativeStyle, ImageQuality, Resolution};
use crate::compose::{self, Color, Compositor, OverlaySpec};
use crate::error::{PinProError, Result};
use crate::gate::ApiKeyGate;
use crate::handoff::HandoffSlot;
use crate::image::{GeneratedImage, GenerationRequest, ImageProvider};
use image::RgbaImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Shown when the provider rejects the key or model entity.
pub const CREDENTIAL_INVALID_MESSAGE: &str =
    "Requested entity not found. Please ensure you have a valid Paid Key selected.";

/// Shown when the key picker itself fails.
pub const GATE_FAILURE_MESSAGE: &str = "Key selector failed. Please check your settings.";

/// Where the generation state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    CheckingCredential,
    AwaitingGeneration,
    Succeeded,
    Failed,
}

impl Phase {
    /// Whether a request is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::CheckingCredential | Self::AwaitingGeneration)
    }
}

/// Classification of a stored failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Empty prompt. Never stored; reported as [`GenerationOutcome::Skipped`].
    ValidationSkip,
    /// Provider answered without an image; retry with another prompt.
    NoImageReturned,
    /// Provider rejected the credential; reselect a paid key.
    CredentialInvalid,
    /// Anything else the provider call raised.
    TransientProviderError,
    /// The key picker failed. Generation still proceeds.
    GateInteractionError,
}

impl FailureKind {
    /// Maps a provider error onto the workflow taxonomy.
    pub fn classify(error: &PinProError) -> Self {
        match error {
            PinProError::NoImageReturned(_) => Self::NoImageReturned,
            PinProError::CredentialInvalid(_) => Self::CredentialInvalid,
            PinProError::GateInteraction(_) => Self::GateInteractionError,
            _ => Self::TransientProviderError,
        }
    }
}

/// The single error message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudioError {
    pub kind: FailureKind,
    pub message: String,
}

impl StudioError {
    fn from_provider(error: &PinProError) -> Self {
        let kind = FailureKind::classify(error);
        let message = match (kind, error) {
            (FailureKind::NoImageReturned, PinProError::NoImageReturned(msg)) => msg.clone(),
            (FailureKind::CredentialInvalid, _) => CREDENTIAL_INVALID_MESSAGE.to_string(),
            (FailureKind::GateInteractionError, _) => GATE_FAILURE_MESSAGE.to_string(),
            _ => error.to_string(),
        };
        Self { kind, message }
    }
}

/// Proof that a generation was started; hand it back on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "pass the ticket to complete_generation"]
pub struct GenerationTicket {
    seq: u64,
    request: GenerationRequest,
    needs_credential: bool,
}

impl GenerationTicket {
    /// Sequence number of this attempt.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The request to send to the provider.
    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    /// Whether the key picker must run before the provider call.
    pub fn needs_credential(&self) -> bool {
        self.needs_credential
    }
}

/// What happened to a finished generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The image was stored and the surface redrawn.
    Applied,
    /// The failure was stored.
    Failed(StudioError),
    /// A newer request or a reset superseded this one; nothing changed.
    Stale,
}

/// Result of [`PinStudio::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Empty prompt or a request already outstanding; no call was made.
    Skipped,
    /// The call ran; see [`Completion`].
    Completed(Completion),
}

/// Generated image kept by the studio, raw and decoded.
#[derive(Debug, Clone)]
pub struct BaseImage {
    pub generated: GeneratedImage,
    pub pixels: RgbaImage,
}

/// Serializable snapshot of the studio.
#[derive(Debug, Clone, Serialize)]
pub struct StudioStatus {
    pub phase: Phase,
    pub prompt: String,
    pub resolution: Resolution,
    pub style: CreativeStyle,
    pub quality: ImageQuality,
    pub overlay: OverlaySpec,
    pub has_image: bool,
    pub credentialed: bool,
    pub error: Option<StudioError>,
    pub notice: Option<String>,
}

/// Editor state plus the generation workflow for one pin.
#[derive(Debug)]
pub struct PinStudio {
    prompt: String,
    resolution: Resolution,
    style: CreativeStyle,
    quality: ImageQuality,
    overlay: OverlaySpec,
    image: Option<BaseImage>,
    error: Option<StudioError>,
    notice: Option<String>,
    phase: Phase,
    gate: ApiKeyGate,
    latest_seq: u64,
    compositor: Compositor,
}

impl Default for PinStudio {
    fn default() -> Self {
        Self::new(ApiKeyGate::detached())
    }
}

impl PinStudio {
    /// Creates a studio in its initial editing state.
    pub fn new(gate: ApiKeyGate) -> Self {
        let mut studio = Self {
            prompt: String::new(),
            resolution: Resolution::default(),
            style: CreativeStyle::default(),
            quality: ImageQuality::default(),
            overlay: OverlaySpec::default(),
            image: None,
            error: None,
            notice: None,
            phase: Phase::Idle,
            gate,
            latest_seq: 0,
            compositor: Compositor::new(),
        };
        studio.redraw();
        studio
    }

    /// Prepares the studio when it is opened: pre-fills the prompt from the
    /// handoff slot (clearing it) and asks the key environment for its
    /// current state.
    pub async fn mount(&mut self, handoff: &HandoffSlot) -> Result<()> {
        if let Some(prompt) = handoff.take()? {
            tracing::info!("prompt pre-filled from assistant");
            self.prompt = prompt;
        }
        if self.gate.has_active_credential().await.is_none() {
            tracing::debug!("key environment state unknown");
        }
        Ok(())
    }

    // Accessors

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn style(&self) -> CreativeStyle {
        self.style
    }

    pub fn quality(&self) -> ImageQuality {
        self.quality
    }

    pub fn overlay(&self) -> &OverlaySpec {
        &self.overlay
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error(&self) -> Option<&StudioError> {
        self.error.as_ref()
    }

    /// Last non-blocking notice (e.g. a failed key picker).
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn image(&self) -> Option<&BaseImage> {
        self.image.as_ref()
    }

    pub fn gate(&self) -> &ApiKeyGate {
        &self.gate
    }

    /// The current rendered surface.
    pub fn surface(&self) -> &RgbaImage {
        self.compositor.surface()
    }

    /// Whether the generate trigger is enabled.
    pub fn can_generate(&self) -> bool {
        !self.prompt.trim().is_empty() && !self.phase.is_busy()
    }

    /// Whether export is enabled.
    pub fn can_export(&self) -> bool {
        self.image.is_some()
    }

    pub fn status(&self) -> StudioStatus {
        StudioStatus {
            phase: self.phase,
            prompt: self.prompt.clone(),
            resolution: self.resolution,
            style: self.style,
            quality: self.quality,
            overlay: self.overlay.clone(),
            has_image: self.image.is_some(),
            credentialed: self.gate.is_credentialed(),
            error: self.error.clone(),
            notice: self.notice.clone(),
        }
    }

    // Inputs

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
        self.redraw();
    }

    /// Style changes nothing visible but still counts as a redraw trigger.
    pub fn set_style(&mut self, style: CreativeStyle) {
        self.style = style;
        self.redraw();
    }

    pub fn set_quality(&mut self, quality: ImageQuality) {
        self.quality = quality;
    }

    pub fn set_overlay_text(&mut self, text: impl Into<String>) {
        self.overlay.text = text.into();
        self.redraw();
    }

    pub fn set_overlay_color(&mut self, color: Color) {
        self.overlay.color = color;
        self.redraw();
    }

    /// Sets the overlay size, clamped to the supported range.
    pub fn set_font_size(&mut self, size: u32) {
        self.overlay.font_size = OverlaySpec::clamp_font_size(size);
        self.redraw();
    }

    fn redraw(&mut self) {
        let base = self.image.as_ref().map(|image| &image.pixels);
        self.compositor.render(base, &self.overlay, self.resolution);
    }

    // Generation

    /// Starts a generation attempt.
    ///
    /// Returns `None` without touching any state when the prompt is empty or
    /// a request is already outstanding.
    pub fn begin_generation(&mut self) -> Option<GenerationTicket> {
        if !self.can_generate() {
            tracing::debug!(phase = ?self.phase, "generate ignored");
            return None;
        }

        self.error = None;
        self.notice = None;
        self.latest_seq += 1;

        let needs_credential = self.quality.is_premium() && !self.gate.is_credentialed();
        self.phase = if needs_credential {
            Phase::CheckingCredential
        } else {
            Phase::AwaitingGeneration
        };

        let request = GenerationRequest::new(self.prompt.clone())
            .with_resolution(self.resolution)
            .with_style(self.style)
            .with_quality(self.quality);

        tracing::info!(
            seq = self.latest_seq,
            resolution = %self.resolution,
            style = %self.style,
            quality = %self.quality,
            "generation started"
        );

        Some(GenerationTicket {
            seq: self.latest_seq,
            request,
            needs_credential,
        })
    }

    /// Runs the key picker for a ticket that needs it, then moves on to
    /// awaiting generation whatever the picker's outcome.
    pub async fn select_credential(&mut self, ticket: &GenerationTicket) {
        if ticket.seq != self.latest_seq || self.phase != Phase::CheckingCredential {
            return;
        }
        if ticket.needs_credential {
            if let Err(e) = self.gate.request_credential_selection().await {
                self.notice = Some(StudioError::from_provider(&e).message);
            }
        }
        if ticket.seq == self.latest_seq {
            self.phase = Phase::AwaitingGeneration;
        }
    }

    /// Applies the provider's answer for `ticket`.
    ///
    /// Answers for superseded tickets are dropped.
    pub fn complete_generation(
        &mut self,
        ticket: GenerationTicket,
        result: Result<GeneratedImage>,
    ) -> Completion {
        if ticket.seq != self.latest_seq || !self.phase.is_busy() {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.latest_seq,
                "dropping stale generation result"
            );
            return Completion::Stale;
        }

        let decoded = result.and_then(|generated| {
            let pixels = compose::decode_image(&generated.data)?;
            compose::require_dimensions(&pixels)?;
            Ok(BaseImage { generated, pixels })
        });

        match decoded {
            Ok(image) => {
                tracing::info!(
                    seq = ticket.seq,
                    bytes = image.generated.size(),
                    format = image.generated.format.mime_type(),
                    model = image.generated.metadata.model.as_deref().unwrap_or("unknown"),
                    "generation succeeded"
                );
                self.image = Some(image);
                self.phase = Phase::Succeeded;
                self.redraw();
                Completion::Applied
            }
            Err(e) => {
                let error = StudioError::from_provider(&e);
                if error.kind == FailureKind::CredentialInvalid {
                    self.gate.invalidate();
                }
                tracing::warn!(seq = ticket.seq, kind = ?error.kind, "generation failed: {e}");
                self.error = Some(error.clone());
                self.phase = Phase::Failed;
                Completion::Failed(error)
            }
        }
    }

    /// Runs a whole generation against `provider`.
    pub async fn generate<P>(&mut self, provider: &P) -> GenerationOutcome
    where
        P: ImageProvider + ?Sized,
    {
        let Some(ticket) = self.begin_generation() else {
            return GenerationOutcome::Skipped;
        };
        if ticket.needs_credential {
            self.select_credential(&ticket).await;
        }
        let result = provider.generate(&ticket.request).await;
        GenerationOutcome::Completed(self.complete_generation(ticket, result))
    }

    // Reset and export

    /// Returns to the initial editing state.
    ///
    /// Clears image, prompt, error and overlay text; keeps resolution, style,
    /// quality and overlay color/size. Any outstanding request is orphaned.
    pub fn reset(&mut self) {
        self.image = None;
        self.prompt.clear();
        self.error = None;
        self.notice = None;
        self.overlay.text = compose::DEFAULT_OVERLAY_TEXT.to_string();
        self.latest_seq += 1;
        self.phase = Phase::Idle;
        self.redraw();
    }

    /// PNG bytes of the current composite, or `None` before any image was
    /// generated.
    pub fn export_png(&self) -> Result<Option<Vec<u8>>> {
        if !self.can_export() {
            return Ok(None);
        }
        self.compositor.encode_png().map(Some)
    }

    /// Writes `pinpro-{millis}.png` into `dir`, or does nothing before any
    /// image was generated.
    pub fn export(&self, dir: impl AsRef<Path>) -> Result<Option<PathBuf>> {
        let Some(png) = self.export_png()? else {
            tracing::debug!("export ignored: no generated image");
            return Ok(None);
        };
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(compose::export_file_name(millis));
        std::fs::write(&path, png)?;
        tracing::info!(path = %path.display(), "pin exported");
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::tests::solid_png;
    use crate::gate::tests::FakeEnvironment;
    use crate::image::{GenerationMetadata, ImageFormat};
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    /// Provider returning scripted answers and recording requests.
    struct ScriptedProvider {
        answers: Mutex<Vec<Result<GeneratedImage>>>,
        requests: Mutex<Vec<GenerationRequest>>,
        picker: Option<Arc<FakeEnvironment>>,
        picker_calls_seen: Mutex<Vec<u32>>,
    }

    impl ScriptedProvider {
        fn new(answers: Vec<Result<GeneratedImage>>) -> Self {
            Self {
                answers: Mutex::new(answers),
                requests: Mutex::new(Vec::new()),
                picker: None,
                picker_calls_seen: Mutex::new(Vec::new()),
            }
        }

        fn watching(mut self, env: Arc<FakeEnvironment>) -> Self {
            self.picker = Some(env);
            self
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ImageProvider for ScriptedProvider {
        async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(env) = &self.picker {
                self.picker_calls_seen
                    .lock()
                    .unwrap()
                    .push(env.picker_calls.load(Ordering::SeqCst));
            }
            self.answers.lock().unwrap().remove(0)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn png_image(color: [u8; 4]) -> GeneratedImage {
        GeneratedImage::new(
            solid_png(16, 16, color),
            ImageFormat::Png,
            GenerationMetadata::default(),
        )
    }

    fn studio_with_env(env: Arc<FakeEnvironment>) -> PinStudio {
        PinStudio::new(ApiKeyGate::new(env))
    }

    #[tokio::test]
    async fn test_empty_prompt_is_inert() {
        let provider = ScriptedProvider::new(vec![]);
        let mut studio = PinStudio::default();
        let before = studio.status();

        assert_eq!(studio.generate(&provider).await, GenerationOutcome::Skipped);
        studio.set_prompt("   ");
        assert_eq!(studio.generate(&provider).await, GenerationOutcome::Skipped);

        assert_eq!(provider.calls(), 0);
        assert_eq!(studio.phase(), before.phase);
        assert!(studio.error().is_none());
    }

    #[tokio::test]
    async fn test_success_stores_exact_bytes_and_redraws() {
        let image = png_image([0, 200, 0, 255]);
        let bytes = image.data.clone();
        let provider = ScriptedProvider::new(vec![Ok(image)]);
        let mut studio = PinStudio::default();
        studio.set_prompt("Forest with lanterns");
        studio.set_overlay_text("");

        let outcome = studio.generate(&provider).await;
        assert_eq!(outcome, GenerationOutcome::Completed(Completion::Applied));
        assert_eq!(studio.phase(), Phase::Succeeded);
        assert_eq!(studio.image().unwrap().generated.data, bytes);

        let px = studio.surface().get_pixel(10, 10);
        assert!(px[1] >= 199 && px[0] <= 1);
        assert!(studio.can_generate());
    }

    #[tokio::test]
    async fn test_no_image_returned_keeps_credential() {
        let env = Arc::new(FakeEnvironment::default());
        env.selected.store(true, Ordering::SeqCst);
        let mut gate = ApiKeyGate::new(env.clone());
        assert_eq!(gate.has_active_credential().await, Some(true));
        let mut studio = PinStudio::new(gate);
        studio.set_prompt("A cat");

        let provider = ScriptedProvider::new(vec![Err(PinProError::NoImageReturned(
            "The AI didn't return an image. Try a different prompt.".into(),
        ))]);
        let outcome = studio.generate(&provider).await;

        let error = studio.error().unwrap();
        assert_eq!(error.kind, FailureKind::NoImageReturned);
        assert_eq!(
            error.message,
            "The AI didn't return an image. Try a different prompt."
        );
        assert!(matches!(
            outcome,
            GenerationOutcome::Completed(Completion::Failed(_))
        ));
        assert_eq!(studio.phase(), Phase::Failed);
        assert!(studio.gate().is_credentialed());
        assert!(studio.can_generate());
    }

    #[tokio::test]
    async fn test_credential_invalid_resets_gate() {
        let env = Arc::new(FakeEnvironment::default());
        let mut studio = studio_with_env(env.clone());
        studio.set_quality(ImageQuality::HighDefinition);
        studio.set_prompt("A cat");

        let provider = ScriptedProvider::new(vec![Err(PinProError::CredentialInvalid(
            "Requested entity was not found.".into(),
        ))]);
        studio.generate(&provider).await;

        let error = studio.error().unwrap();
        assert_eq!(error.kind, FailureKind::CredentialInvalid);
        assert_eq!(error.message, CREDENTIAL_INVALID_MESSAGE);
        assert!(!studio.gate().is_credentialed());
        assert_eq!(studio.phase(), Phase::Failed);
    }

    #[tokio::test]
    async fn test_transient_error_message_is_verbatim() {
        let provider = ScriptedProvider::new(vec![Err(PinProError::Api {
            status: 500,
            message: "backend exploded".into(),
        })]);
        let mut studio = PinStudio::default();
        studio.set_prompt("A cat");
        studio.generate(&provider).await;

        let error = studio.error().unwrap();
        assert_eq!(error.kind, FailureKind::TransientProviderError);
        assert_eq!(error.message, "API error: 500 - backend exploded");
    }

    #[tokio::test]
    async fn test_hd_without_credential_runs_picker_once_before_call() {
        let env = Arc::new(FakeEnvironment::default());
        let mut studio = studio_with_env(env.clone());
        studio.set_quality(ImageQuality::HighDefinition);
        studio.set_prompt("A cat");

        let provider =
            ScriptedProvider::new(vec![Ok(png_image([1, 2, 3, 255]))]).watching(env.clone());
        studio.generate(&provider).await;

        assert_eq!(env.picker_calls.load(Ordering::SeqCst), 1);
        assert_eq!(*provider.picker_calls_seen.lock().unwrap(), vec![1]);
        assert_eq!(
            provider.requests.lock().unwrap()[0].quality,
            ImageQuality::HighDefinition
        );
        assert!(studio.gate().is_credentialed());
    }

    #[tokio::test]
    async fn test_hd_with_credential_skips_picker() {
        let env = Arc::new(FakeEnvironment::default());
        let mut gate = ApiKeyGate::new(env.clone());
        gate.request_credential_selection().await.unwrap();
        let mut studio = PinStudio::new(gate);
        studio.set_quality(ImageQuality::HighDefinition);
        studio.set_prompt("A cat");

        let provider = ScriptedProvider::new(vec![Ok(png_image([1, 2, 3, 255]))]);
        studio.generate(&provider).await;
        assert_eq!(env.picker_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_standard_never_runs_picker() {
        let env = Arc::new(FakeEnvironment::default());
        let mut studio = studio_with_env(env.clone());
        studio.set_prompt("A cat");

        let provider = ScriptedProvider::new(vec![Ok(png_image([1, 2, 3, 255]))]);
        studio.generate(&provider).await;
        assert_eq!(env.picker_calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_picker_failure_still_generates() {
        let env = Arc::new(FakeEnvironment::default());
        env.fail_picker.store(true, Ordering::SeqCst);
        let mut studio = studio_with_env(env.clone());
        studio.set_quality(ImageQuality::HighDefinition);
        studio.set_prompt("A cat");

        let provider = ScriptedProvider::new(vec![Ok(png_image([1, 2, 3, 255]))]);
        let outcome = studio.generate(&provider).await;

        assert_eq!(outcome, GenerationOutcome::Completed(Completion::Applied));
        assert_eq!(provider.calls(), 1);
        assert!(!studio.gate().is_credentialed());
        assert_eq!(studio.notice(), Some(GATE_FAILURE_MESSAGE));
        assert!(studio.error().is_none());
    }

    #[test]
    fn test_second_trigger_while_outstanding_is_ignored() {
        let mut studio = PinStudio::default();
        studio.set_prompt("A cat");
        let ticket = studio.begin_generation().unwrap();
        assert_eq!(studio.phase(), Phase::AwaitingGeneration);
        assert!(!studio.can_generate());
        assert!(studio.begin_generation().is_none());

        let completion = studio.complete_generation(ticket, Ok(png_image([9, 9, 9, 255])));
        assert_eq!(completion, Completion::Applied);
        assert!(studio.begin_generation().is_some());
    }

    #[test]
    fn test_new_attempt_clears_previous_error() {
        let mut studio = PinStudio::default();
        studio.set_prompt("A cat");
        let ticket = studio.begin_generation().unwrap();
        studio.complete_generation(ticket, Err(PinProError::Decode("bad".into())));
        assert!(studio.error().is_some());

        let _ticket = studio.begin_generation().unwrap();
        assert!(studio.error().is_none());
    }

    #[test]
    fn test_undecodable_image_fails_softly() {
        let mut studio = PinStudio::default();
        studio.set_prompt("A cat");
        let ticket = studio.begin_generation().unwrap();
        let garbage = GeneratedImage::new(
            b"not really a png".to_vec(),
            ImageFormat::Png,
            GenerationMetadata::default(),
        );
        let completion = studio.complete_generation(ticket, Ok(garbage));
        assert!(matches!(completion, Completion::Failed(_)));
        assert!(studio.image().is_none());
        assert_eq!(studio.phase(), Phase::Failed);
    }

    #[test]
    fn test_reset_orphans_outstanding_request() {
        let mut studio = PinStudio::default();
        studio.set_prompt("A cat");
        let ticket = studio.begin_generation().unwrap();
        studio.reset();

        let completion = studio.complete_generation(ticket, Ok(png_image([1, 1, 1, 255])));
        assert_eq!(completion, Completion::Stale);
        assert!(studio.image().is_none());
        assert_eq!(studio.phase(), Phase::Idle);
    }

    #[test]
    fn test_reset_restores_editing_state_only() {
        let mut studio = PinStudio::default();
        studio.set_prompt("A cat");
        studio.set_resolution(Resolution::Story1080x1920);
        studio.set_style(CreativeStyle::NeonCyber);
        studio.set_quality(ImageQuality::HighDefinition);
        studio.set_overlay_text("Fall recipes");
        studio.set_overlay_color(Color::rgb(1, 2, 3));
        studio.set_font_size(64);

        let ticket = studio.begin_generation().unwrap();
        studio.complete_generation(ticket, Err(PinProError::Decode("x".into())));
        studio.reset();

        assert!(studio.image().is_none());
        assert_eq!(studio.prompt(), "");
        assert!(studio.error().is_none());
        assert_eq!(studio.overlay().text, compose::DEFAULT_OVERLAY_TEXT);
        assert_eq!(studio.resolution(), Resolution::Story1080x1920);
        assert_eq!(studio.style(), CreativeStyle::NeonCyber);
        assert_eq!(studio.quality(), ImageQuality::HighDefinition);
        assert_eq!(studio.overlay().color, Color::rgb(1, 2, 3));
        assert_eq!(studio.overlay().font_size, 64);
        assert_eq!(studio.surface().dimensions(), (337, 600));
    }

    #[test]
    fn test_export_disabled_until_image_exists() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let mut studio = PinStudio::default();
        assert!(!studio.can_export());
        assert_eq!(studio.export_png()?, None);
        assert_eq!(studio.export(temp.path())?, None);
        assert_eq!(std::fs::read_dir(temp.path())?.count(), 0);

        studio.set_prompt("A cat");
        let ticket = studio.begin_generation().unwrap();
        studio.complete_generation(ticket, Ok(png_image([5, 6, 7, 255])));
        assert!(studio.can_export());

        let path = studio.export(temp.path())?.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("pinpro-") && name.ends_with(".png"));
        let written = std::fs::read(&path)?;
        assert_eq!(Some(written), studio.export_png()?);
        Ok(())
    }

    #[test]
    fn test_overlay_edits_redraw_surface() {
        let mut studio = PinStudio::default();
        let before = studio.surface().clone();
        studio.set_overlay_text("Different words");
        assert_ne!(studio.surface(), &before);

        studio.set_overlay_text(compose::DEFAULT_OVERLAY_TEXT);
        assert_eq!(studio.surface(), &before);

        studio.set_font_size(500);
        assert_eq!(studio.overlay().font_size, 100);
    }

    #[tokio::test]
    async fn test_mount_takes_handoff_prompt() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let slot = HandoffSlot::new(temp.path());
        slot.store("Golden hour picnic")?;

        let mut studio = PinStudio::default();
        studio.mount(&slot).await?;
        assert_eq!(studio.prompt(), "Golden hour picnic");
        assert_eq!(slot.take()?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_explicit_prompt_still_consumes_handoff() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let slot = HandoffSlot::new(temp.path());
        slot.store("Stale suggestion")?;

        let mut studio = PinStudio::default();
        studio.mount(&slot).await?;
        studio.set_prompt("Typed by hand");
        assert_eq!(studio.prompt(), "Typed by hand");
        assert!(!slot.path().exists());

        let mut next = PinStudio::default();
        next.mount(&slot).await?;
        assert_eq!(next.prompt(), "");
        Ok(())
    }

    #[tokio::test]
    async fn test_mount_reads_key_environment() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let env = Arc::new(FakeEnvironment::default());
        env.selected.store(true, Ordering::SeqCst);
        let mut studio = studio_with_env(env.clone());
        studio.mount(&HandoffSlot::new(temp.path())).await?;
        assert!(studio.gate().is_credentialed());

        studio.set_quality(ImageQuality::HighDefinition);
        studio.set_prompt("A cat");
        let provider = ScriptedProvider::new(vec![Ok(png_image([1, 2, 3, 255]))]);
        studio.generate(&provider).await;
        assert_eq!(env.picker_calls.load(Ordering::SeqCst), 0);
        Ok(())
    }
}
