use crate::{http::uri::UriError, StatusCode};

macro_rules! http_errors {
    ($(
        $(#[$docs:meta])*
        $name:ident: $status:ident => $msg:literal;
    )*) => {
        /// Reason a request was refused before reaching application logic.
        ///
        /// Every variant maps to exactly one [`StatusCode`], and every refusal
        /// closes the connection after the error response.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
        pub enum ErrorKind { $(
            $(#[$docs])*
            #[error($msg)]
            $name,
        )* }

        impl ErrorKind {
            /// Status sent back to the client for this refusal.
            #[inline]
            pub const fn status(&self) -> StatusCode {
                match self { $(
                    Self::$name => StatusCode::$status,
                )* }
            }
        }
    };
}

http_errors! {
    /// Version token was neither `HTTP/1.0` nor `HTTP/1.1`
    UnsupportedVersion: HttpVersionNotSupported => "HTTP version not supported";

    EmptyUri: BadRequest => "empty request target";
    /// More than one `Host` header line
    DuplicateHost: BadRequest => "duplicate Host header";
    InvalidHost: BadRequest => "invalid Host header";
    /// HTTP/1.1 request without a usable host
    MissingHost: BadRequest => "missing Host header";
    InvalidUri: BadRequest => "invalid request target";
    /// `*` target used with a method other than OPTIONS
    AsteriskNotAllowed: BadRequest => "'*' target is only allowed for OPTIONS";

    InvalidContentLength: BadRequest => "Content-Length is not a number";
    NegativeContentLength: BadRequest => "negative Content-Length";
    ContentLengthTooLarge: PayloadTooLarge => "Content-Length out of range";

    /// `Expect` carried something other than `100-continue`
    UnsupportedExpectation: ExpectationFailed => "unsupported expectation";
    ExpectFromHttp10: ExpectationFailed => "100-continue from an HTTP/1.0 client";

    /// GET or HEAD announced a body
    UnexpectedBody: BadRequest => "GET/HEAD with a positive Content-Length";
    LengthRequired: LengthRequired => "POST without Content-Length";
}

impl From<UriError> for ErrorKind {
    fn from(err: UriError) -> Self {
        match err {
            UriError::InvalidHost => ErrorKind::InvalidHost,
            _ => ErrorKind::InvalidUri,
        }
    }
}
