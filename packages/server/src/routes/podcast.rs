//! `POST /api/generate_podcast`, streamed as Server-Sent Events.

use std::convert::Infallible;

use axum::extract::{Multipart, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use podcast_domain::{ProgressEvent, SessionId, SpeakerKind, SpeakerSlot};
use podcast_studio::storage::{self, AUDIO_EXTENSIONS, PDF_EXTENSIONS, accepted_upload_name};
use podcast_studio::{PodcastRequest, SpeakerRequest, SpeechProvider, Studio, UploadedFile};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::routes::form::FormData;
use crate::state::AppState;

pub async fn generate_podcast<P: SpeechProvider>(
    State(state): State<AppState<P>>,
    multipart: Multipart,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let session = SessionId::generate();
    info!(session = %session, "podcast request received");

    let events: BoxStream<'static, ProgressEvent> = match FormData::collect(multipart).await {
        Ok(form) => match build_request(&state.studio, &form, &session).await {
            Ok(request) => state.studio.generate_podcast(request, session).boxed(),
            Err(err) => single_error(err.to_string()),
        },
        Err(err) => single_error(err.to_string()),
    };

    let events = events.map(move |event| {
        debug!(session = %session, kind = event.kind(), "sse event");
        if event.is_terminal() {
            info!(session = %session, kind = event.kind(), "podcast stream finished");
        }
        Ok(to_sse(&event))
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

fn single_error(message: String) -> BoxStream<'static, ProgressEvent> {
    stream::once(async move { ProgressEvent::error(message) }).boxed()
}

fn to_sse(event: &ProgressEvent) -> Event {
    match Event::default().json_data(event) {
        Ok(sse) => sse,
        Err(err) => {
            warn!(error = %err, "failed to serialize progress event");
            Event::default().data(r#"{"type":"error","message":"internal serialization error"}"#)
        }
    }
}

/// Read the form, saving accepted uploads under the session prefix. Nothing
/// is saved when the API key is missing; the studio reports that itself.
async fn build_request<P: SpeechProvider>(
    studio: &Studio<P>,
    form: &FormData,
    session: &SessionId,
) -> Result<PodcastRequest> {
    let mut request = PodcastRequest {
        api_key: form.text("api_key"),
        text_input: form.text("text_input"),
        url: form.text("url"),
        ..PodcastRequest::default()
    };
    let save_uploads = !request.api_key.is_empty();

    if save_uploads
        && let Some(file) = form.file("pdf_file")
        && let Some(name) = accepted_upload_name(&file.file_name, PDF_EXTENSIONS)
    {
        let path = studio
            .storage()
            .save_upload(&storage::pdf_upload_name(session, &name), &file.data)
            .await?;
        request.pdf = Some(UploadedFile { path, name });
    }

    for slot in SpeakerSlot::ALL {
        let n = slot.number();
        let mut speaker = SpeakerRequest {
            kind: form.text(&format!("speaker{n}_type")),
            voice_name: form.text(&format!("speaker{n}_voice_name")),
            audio: None,
        };

        let is_custom = matches!(speaker.parsed_kind(), Ok(SpeakerKind::Custom));
        if save_uploads
            && is_custom
            && let Some(file) = form.file(&format!("speaker{n}_audio"))
            && let Some(name) = accepted_upload_name(&file.file_name, AUDIO_EXTENSIONS)
        {
            let path = studio
                .storage()
                .save_upload(&storage::speaker_upload_name(session, slot, &name), &file.data)
                .await?;
            speaker.audio = Some(path);
        }

        match slot {
            SpeakerSlot::Speaker1 => request.speaker1 = speaker,
            SpeakerSlot::Speaker2 => request.speaker2 = speaker,
        }
    }

    Ok(request)
}
