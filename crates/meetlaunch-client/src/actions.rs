//! Meeting actions: build the launch URI and hand it to the OS.

use meetlaunch_core::MeetingDescriptor;
use tracing::info;
use url::Url;

use crate::config::LaunchSettings;
use crate::error::{ClientError, ClientResult};

/// Builds the URI that makes the conferencing application join `meeting`.
///
/// The passcode is only included when the meeting has one.
pub fn launch_uri(meeting: &MeetingDescriptor, settings: &LaunchSettings) -> ClientResult<String> {
    let conference_id = meeting
        .conference_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            ClientError::Action(format!("\"{}\" has no video conference to join", meeting.title))
        })?;

    let mut uri = Url::parse(&format!("{}://{}/join", settings.scheme, settings.host))
        .map_err(|e| ClientError::Config(format!("invalid launch target: {}", e)))?;

    {
        let mut query = uri.query_pairs_mut();
        query.append_pair("action", "join");
        query.append_pair("confno", conference_id);
        if let Some(passcode) = meeting.passcode.as_deref().filter(|p| !p.is_empty()) {
            query.append_pair("pwd", passcode);
        }
    }

    Ok(uri.into())
}

/// Opens the launch URI for `meeting` with the default handler.
///
/// Returns the URI that was opened.
pub fn launch(meeting: &MeetingDescriptor, settings: &LaunchSettings) -> ClientResult<String> {
    let uri = launch_uri(meeting, settings)?;

    info!(uri = %uri, "launching meeting");
    open::that(&uri).map_err(|e| ClientError::Action(format!("failed to open {}: {}", uri, e)))?;

    Ok(uri)
}
