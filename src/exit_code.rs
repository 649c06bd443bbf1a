use crate::error::TonicPowError;

pub fn exit_code_for_error(err: &TonicPowError) -> i32 {
    match err {
        TonicPowError::InvalidApiKey
        | TonicPowError::InvalidEnvironment(_)
        | TonicPowError::InvalidApiUrl(_) => 2,
        TonicPowError::InvalidUrl(_) | TonicPowError::InvalidHeader(_) => 3,
        TonicPowError::MissingUserSession
        | TonicPowError::MissingField(_)
        | TonicPowError::InvalidArgument(_) => 4,
        TonicPowError::MissingSessionCookie => 43,
        TonicPowError::Api(_) => 22,
        TonicPowError::Json(_) => 26,
        TonicPowError::Http(err) => http_exit_code(err),
    }
}

fn http_exit_code(err: &reqwest::Error) -> i32 {
    if err.is_timeout() {
        return 28;
    }
    if err.is_connect() {
        return 7;
    }
    43
}
