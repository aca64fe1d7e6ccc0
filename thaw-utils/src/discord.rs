use serenity::http::HttpError;

/// Discord JSON error code: the member is not part of the guild.
pub const UNKNOWN_MEMBER: isize = 10007;
/// Discord JSON error code: the role does not exist.
pub const UNKNOWN_ROLE: isize = 10011;
/// Discord JSON error code: the user account does not exist.
pub const UNKNOWN_USER: isize = 10013;
/// Discord JSON error code: the user is not banned.
pub const UNKNOWN_BAN: isize = 10026;
/// Discord JSON error code: the bot lacks a permission for the request.
pub const MISSING_PERMISSIONS: isize = 50013;

/// The parts of an unsuccessful Discord REST response worth keeping around.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpFailure {
    pub status: u16,
    pub code: isize,
    pub message: String,
}

/// Pull status and JSON error code out of a serenity error, if it came from Discord.
pub fn http_failure(source: &serenity::Error) -> Option<HttpFailure> {
    match source {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => Some(HttpFailure {
            status: response.status_code.as_u16(),
            code: response.error.code,
            message: response.error.message.clone(),
        }),
        _ => None,
    }
}

/// Whether a failure means the bot is not allowed to perform the request.
pub fn is_missing_permissions(failure: &HttpFailure) -> bool {
    failure.status == 403 || failure.code == MISSING_PERMISSIONS
}
