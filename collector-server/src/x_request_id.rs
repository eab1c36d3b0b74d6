use std::convert::Infallible;
use std::fmt::{Display, Formatter};

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use rand::Rng;
use serde_derive::{Deserialize, Serialize};

use commons_error::*;

const X_REQUEST_ID_HEADER: &str = "X-Request-ID";

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct XRequestID(Option<u32>);

impl XRequestID {
    pub fn from_value(val: Option<u32>) -> Self {
        XRequestID(val)
    }

    pub fn value(&self) -> Option<u32> {
        self.0
    }

    /// Regenerate a x_request_id if none
    pub fn new_if_null(&self) -> Self {
        let t_value = match self.0 {
            Some(t) => t,
            None => Self::generate(),
        };
        XRequestID(Some(t_value))
    }

    fn generate() -> u32 {
        let mut rng = rand::thread_rng();
        rng.gen_range(0..1_000_000)
    }
}

impl Display for XRequestID {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(t) => write!(f, "{}", t),
            None => write!(f, "None"),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for XRequestID
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let x_request_id = parts.headers.get(X_REQUEST_ID_HEADER).map(|t| {
            t.to_str()
                .unwrap_or_default()
                .parse::<u32>()
                .map_err(err_fwd!("Cannot parse the x_request_id from the header, set default to 0"))
                .unwrap_or(0u32)
        });

        Ok(XRequestID(x_request_id))
    }
}

/// What goes along with a request in the logs
#[derive(Debug, Clone)]
pub struct Follower {
    pub x_request_id: XRequestID,
}

impl Display for Follower {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "X:{}", self.x_request_id)
    }
}
