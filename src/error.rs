use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Why a reminder message could not be handed to Discord.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("missing permissions to send in channel")]
    Forbidden,

    #[error("delivery failed: {0}")]
    Other(String),
}

impl From<serenity::Error> for DeliveryError {
    fn from(err: serenity::Error) -> Self {
        use serenity::http::HttpError;

        match &err {
            serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
                if response.status_code.as_u16() == 403 =>
            {
                DeliveryError::Forbidden
            }
            _ => DeliveryError::Other(err.to_string()),
        }
    }
}
