//! Upload and download request handlers

use actix_multipart::{Field, Multipart};
use actix_web::http::header;
use actix_web::{web, Error, HttpMessage, HttpRequest, HttpResponse};
use bytes::BytesMut;
use futures::StreamExt;
use log::{debug, info, warn};
use std::io::Write;

use crate::app_state::AppState;
use crate::share::disposition::decide_disposition;
use crate::share::naming;
use crate::share::stream::ReaderStream;
use crate::share::{bad_request, storage_fault, MdcEntryScope};

/// Handles a multipart POST: streams exactly one file part into a newly
/// created storage entry, finalizes it and replies with the retrieval URL
/// `<protocol_host><id><ext>`.
pub async fn upload_handler(
    req: HttpRequest,
    mut payload: Multipart,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let media_type = req
        .mime_type()
        .map_err(|_| bad_request("unparseable Content-Type header"))?
        .ok_or_else(|| bad_request("missing Content-Type header"))?;
    if media_type.type_() != mime::MULTIPART || media_type.get_param(mime::BOUNDARY).is_none() {
        return Err(bad_request("Content-Type is not a multipart type with a boundary"));
    }

    let mut entry = state
        .storage
        .create_entry()
        .map_err(|e| storage_fault("failed to allocate storage entry", e))?;
    let _mdc = MdcEntryScope::set(entry.id());
    entry
        .save()
        .map_err(|e| storage_fault("failed to persist initial entry state", e))?;

    // The writer is a scoped resource: it drops on every exit path below,
    // and must be gone before finalize.
    let mut writer = entry
        .open_writer()
        .map_err(|e| storage_fault("failed to open write sink", e))?;

    let mut first_field = match payload.next().await {
        Some(Ok(field)) => field,
        Some(Err(e)) => return Err(storage_fault("failed to read multipart part", e)),
        None => return Err(storage_fault("multipart body", "no part available")),
    };

    let content_type = first_field
        .content_type()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let filename = match first_field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
    {
        Some(name) if naming::extension_of(name).is_some() => name.to_string(),
        Some(name) => {
            return Err(bad_request(&format!("filename {:?} has no extension", name)));
        }
        None => return Err(bad_request("multipart part carries no filename")),
    };
    entry.set_content_type(&content_type);
    entry.set_filename(&filename);
    debug!("Receiving {} ({}) into entry {}", filename, content_type, entry.id());

    let buffer_size = state.config.share.buffer_size;
    copy_field(&mut first_field, writer.as_mut(), buffer_size).await?;
    // Multipart yields the next part only once the previous Field is dropped.
    drop(first_field);

    // Drain any further parts into the same sink; the recorded metadata
    // stays that of the first part.
    while let Some(next) = payload.next().await {
        let mut field = next.map_err(|e| storage_fault("failed to read multipart part", e))?;
        copy_field(&mut field, writer.as_mut(), buffer_size).await?;
    }

    drop(writer);
    entry
        .finalize()
        .map_err(|e| storage_fault("failed to finalize entry", e))?;

    let extension = naming::extension_of(entry.filename())
        .ok_or_else(|| bad_request("recorded filename has no extension"))?;
    let url = format!("{}{}{}", state.config.share.protocol_host, entry.id(), extension);
    info!("Stored entry {} as {}", entry.id(), url);

    let mut builder = HttpResponse::Ok();
    state.apply_request_hook(&req, &mut builder);
    Ok(builder.content_type("text/plain").body(url))
}

/// Copies one multipart field to the write sink through a bounded buffer
async fn copy_field(
    field: &mut Field,
    writer: &mut (dyn Write + Send),
    buffer_size: usize,
) -> Result<(), Error> {
    let mut buffer = BytesMut::with_capacity(buffer_size);
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| storage_fault("failed to read part bytes", e))?;
        buffer.extend_from_slice(&chunk);
        if buffer.len() >= buffer_size {
            writer
                .write_all(&buffer)
                .map_err(|e| storage_fault("failed to write to storage sink", e))?;
            buffer.clear();
        }
    }
    if !buffer.is_empty() {
        writer
            .write_all(&buffer)
            .map_err(|e| storage_fault("failed to write to storage sink", e))?;
    }
    Ok(())
}

/// Handles a GET of `<id>.<ext>`: resolves the entry, applies conditional-GET
/// and disposition policy, and streams the stored bytes back.
pub async fn download_handler(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let segment = path.into_inner();
    let id = match naming::id_of(&segment) {
        Some(id) => id.to_string(),
        None => {
            warn!("Download path segment {:?} has no extension", segment);
            return Ok(not_found(&state, &req));
        }
    };
    let _mdc = MdcEntryScope::set(&id);

    let entry = match state.storage.load_entry(&id) {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            debug!("Unknown entry id {}", id);
            return Ok(not_found(&state, &req));
        }
        Err(e) => return Err(storage_fault("failed to look up entry", e)),
    };

    let if_none_match = req
        .headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok());
    if if_none_match == Some(entry.etag()) {
        debug!("Entry {} not modified", id);
        let mut builder = HttpResponse::NotModified();
        state.apply_request_hook(&req, &mut builder);
        return Ok(builder.finish());
    }

    let reader = entry
        .open_reader()
        .map_err(|e| storage_fault("failed to open read source", e))?;

    let disposition = decide_disposition(
        entry.content_type(),
        &state.config.share.whitelisted_content_types,
    );
    debug!("Serving entry {} as {}", id, disposition.as_str());

    let mut builder = HttpResponse::Ok();
    state.apply_request_hook(&req, &mut builder);
    builder
        .insert_header((header::CONTENT_DISPOSITION, disposition.header_value(entry.filename())))
        .insert_header((header::CONTENT_TYPE, entry.content_type()))
        .insert_header((header::ETAG, entry.etag()));
    Ok(builder.streaming(ReaderStream::new(reader, state.config.share.buffer_size)))
}

fn not_found(state: &AppState, req: &HttpRequest) -> HttpResponse {
    let mut builder = HttpResponse::NotFound();
    state.apply_request_hook(req, &mut builder);
    builder.body("404 page not found")
}
