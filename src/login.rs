//! AppRole login client: one request, one response, one classified outcome.
//!
//! The client never retries. Wrap [`LoginClient::login`] in a
//! [`crate::retry::RetryScheduler`] to get the deadline-bounded retry loop.
//!
//! Response handling:
//!
//! - Body is not a JSON object: [`Error::MalformedResponse`] (fatal).
//! - `errors` is present and non-empty (list, mapping, or string): [`Error::RemoteRejection`]; the
//!   [`RejectionClassifier`] decides whether it is transient.
//! - Otherwise the body must carry `request_id` and `auth.client_token`; both missing or blank
//!   yields [`Error::MalformedResponse`], wrongly typed fields yield [`Error::ResponseParse`].

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	auth::{Credential, LoginRequest, RequestId},
	error::TransientCause,
	http::{LoginTransport, TrustConfig},
	obs,
	retry::{Clock, SystemClock},
};

const REDACTED: &str = "<redacted>";

/// Strategy hook deciding whether a remote rejection is transient.
///
/// The rejection text is the only signal the service offers here, so classification is isolated
/// behind this trait and can be swapped once typed error codes exist.
pub trait RejectionClassifier
where
	Self: Send + Sync,
{
	/// Returns the transient cause, or `None` when the rejection is fatal.
	fn classify(&self, ctx: &RejectionContext) -> Option<TransientCause>;
}

/// Data handed to a [`RejectionClassifier`].
#[derive(Clone, Copy, Debug)]
pub struct RejectionContext<'a> {
	/// HTTP status of the rejecting response.
	pub status: u16,
	/// The raw `errors` value.
	pub errors: &'a Value,
	/// Compact JSON rendering of `errors`.
	pub errors_text: &'a str,
}

/// Default classifier: rejections mentioning `internal error` are transient.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubstringClassifier;
impl SubstringClassifier {
	/// Marker the service uses for server-side failures worth retrying.
	pub const INTERNAL_ERROR: &'static str = "internal error";
}
impl RejectionClassifier for SubstringClassifier {
	fn classify(&self, ctx: &RejectionContext) -> Option<TransientCause> {
		ctx.errors_text.contains(Self::INTERNAL_ERROR).then_some(TransientCause::InternalError)
	}
}

/// Unparsed login response; lives for a single attempt.
#[derive(Clone, PartialEq)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Body exactly as received.
	pub text: String,
	/// Body decoded as a JSON object, when it is one.
	pub decoded: Option<Map<String, Value>>,
}
impl RawResponse {
	/// Captures a response and attempts the structured decode.
	pub fn new(status: u16, text: impl Into<String>) -> Self {
		let text = text.into();
		let decoded = serde_json::from_str(&text).ok();

		Self { status, text, decoded }
	}

	/// Renders the decoded body with token fields replaced, for debug logging.
	pub fn redacted(&self) -> Option<String> {
		let mut decoded = self.decoded.clone()?;

		if let Some(Value::Object(auth)) = decoded.get_mut("auth") {
			for field in ["client_token", "accessor"] {
				if let Some(value) = auth.get_mut(field) {
					*value = Value::String(REDACTED.into());
				}
			}
		}

		Some(Value::Object(decoded).to_string())
	}
}
impl Debug for RawResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RawResponse")
			.field("status", &self.status)
			.field("text_bytes", &self.text.len())
			.field("decoded", &self.decoded.is_some())
			.finish()
	}
}

#[derive(Deserialize)]
struct LoginResponse {
	#[serde(default)]
	request_id: Option<String>,
	#[serde(default)]
	lease_duration: Option<i64>,
	#[serde(default)]
	renewable: Option<bool>,
	#[serde(default)]
	auth: Option<LoginAuth>,
}

#[derive(Deserialize)]
struct LoginAuth {
	#[serde(default)]
	client_token: Option<String>,
	#[serde(default)]
	lease_duration: Option<i64>,
	#[serde(default)]
	renewable: Option<bool>,
}

/// Performs AppRole logins over a [`LoginTransport`].
pub struct LoginClient<T>
where
	T: ?Sized + LoginTransport,
{
	transport: Arc<T>,
	classifier: Arc<dyn RejectionClassifier>,
	clock: Arc<dyn Clock>,
	debug: bool,
}
impl<T> LoginClient<T>
where
	T: ?Sized + LoginTransport,
{
	/// Creates a client using the default classifier and the wall clock.
	pub fn new(transport: Arc<T>) -> Self {
		Self {
			transport,
			classifier: Arc::new(SubstringClassifier),
			clock: Arc::new(SystemClock),
			debug: false,
		}
	}

	/// Overrides the rejection classifier.
	pub fn with_classifier(mut self, classifier: Arc<dyn RejectionClassifier>) -> Self {
		self.classifier = classifier;

		self
	}

	/// Overrides the clock used to stamp `acquired_at`.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Enables logging of the (redacted) login payload.
	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;

		self
	}

	/// Logs in once and returns the issued credential or a classified error.
	pub async fn login(
		&self,
		request: &LoginRequest,
		address: &Url,
		trust: &TrustConfig,
	) -> Result<Credential> {
		let url = request.endpoint(address)?;
		let body = request.body()?;
		let reply = self.transport.post_json(&url, body, trust).await?;

		obs::login_response(&url, reply.status, reply.body.len());

		let raw = RawResponse::new(reply.status, reply.body);

		if let Some(payload) = self.debug.then(|| raw.redacted()).flatten() {
			obs::login_payload(&url, &payload);
		}

		self.interpret(raw)
	}

	/// Maps a raw response onto a credential or a classified error.
	pub fn interpret(&self, raw: RawResponse) -> Result<Credential> {
		let Some(mut decoded) = raw.decoded else {
			return Err(Error::MalformedResponse {
				message: format!(
					"Vault returned a login response that is not a JSON object (HTTP {}).",
					raw.status
				),
			});
		};

		let errors = decoded.remove("errors").unwrap_or(Value::Null);

		if let Some(errors_text) = rejection_text(&errors) {
			let ctx =
				RejectionContext { status: raw.status, errors: &errors, errors_text: &errors_text };
			let cause = self.classifier.classify(&ctx);

			return Err(Error::RemoteRejection {
				message: format!("Vault returned error(s): {errors_text}"),
				cause,
			});
		}

		let parsed: LoginResponse = serde_path_to_error::deserialize(Value::Object(decoded))
			.map_err(|source| Error::ResponseParse { source })?;
		let request_id = parsed
			.request_id
			.filter(|id| !id.trim().is_empty())
			.ok_or_else(|| malformed("request_id"))
			.and_then(|id| {
				RequestId::new(id).map_err(|e| Error::MalformedResponse {
					message: format!("Vault login response has an invalid `request_id`: {e}"),
				})
			})?;
		let auth = parsed.auth.ok_or_else(|| malformed("auth"))?;
		let token = auth
			.client_token
			.filter(|token| !token.trim().is_empty())
			.ok_or_else(|| malformed("auth.client_token"))?;
		let lease_seconds = match parsed.lease_duration {
			Some(seconds) if seconds > 0 => seconds,
			_ => auth.lease_duration.unwrap_or(0),
		};
		let renewable = parsed.renewable.unwrap_or(false) || auth.renewable.unwrap_or(false);

		Credential::builder(request_id)
			.token(token)
			.lease_duration(Duration::seconds(lease_seconds))
			.renewable(renewable)
			.acquired_at(self.clock.now())
			.raw_json(raw.text)
			.build()
			.map_err(|e| Error::MalformedResponse {
				message: format!("Vault login response is invalid: {e}"),
			})
	}
}
impl<T> Clone for LoginClient<T>
where
	T: ?Sized + LoginTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			classifier: self.classifier.clone(),
			clock: self.clock.clone(),
			debug: self.debug,
		}
	}
}
impl<T> Debug for LoginClient<T>
where
	T: ?Sized + LoginTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginClient").field("debug", &self.debug).finish()
	}
}

fn malformed(field: &str) -> Error {
	Error::MalformedResponse { message: format!("Vault login response is missing `{field}`.") }
}

// Any non-empty `errors` value counts as a rejection; odd shapes are logged, not refused.
fn rejection_text(errors: &Value) -> Option<String> {
	match errors {
		Value::Null => None,
		Value::Array(items) if items.is_empty() => None,
		Value::Object(map) if map.is_empty() => None,
		Value::String(text) if text.is_empty() => None,
		Value::Array(items) => {
			if !items.iter().all(Value::is_string) {
				obs::unexpected_errors_shape("array_of_non_strings");
			}

			Some(errors.to_string())
		},
		Value::Object(_) | Value::String(_) => Some(errors.to_string()),
		Value::Bool(_) => {
			obs::unexpected_errors_shape("bool");

			Some(errors.to_string())
		},
		Value::Number(_) => {
			obs::unexpected_errors_shape("number");

			Some(errors.to_string())
		},
	}
}
