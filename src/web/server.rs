use super::reply::Reply;
use super::request::Incoming;
use super::routes::App;
use crate::error::WebError;

/// Serves requests one at a time until the listener fails.
pub fn serve(bind_addr: &str, app: &mut App) -> Result<(), WebError> {
    let server = tiny_http::Server::http(bind_addr).map_err(|e| WebError::Bind {
        addr: bind_addr.to_string(),
        reason: e.to_string(),
    })?;
    tracing::info!(addr = bind_addr, "survey server listening");

    for mut request in server.incoming_requests() {
        let reply = match Incoming::from_tiny(&mut request) {
            Ok(incoming) => {
                let reply = app.handle(&incoming);
                tracing::debug!(path = %incoming.path, status = reply.status, "request served");
                reply
            }
            Err(err @ WebError::BodyTooLarge { .. }) => {
                tracing::warn!(error = %err, url = %request.url(), "request body rejected");
                Reply::text(413, "Payload too large")
            }
            Err(err) => {
                tracing::warn!(error = %err, "unreadable request");
                Reply::text(400, "Bad request")
            }
        };
        if let Err(err) = request.respond(reply.into_tiny()) {
            tracing::warn!(error = %err, "unable to write response");
        }
    }
    Ok(())
}
