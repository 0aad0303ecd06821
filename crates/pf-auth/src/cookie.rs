//! Identity cookie transport: builds the `Set-Cookie` header value emitted
//! via response metadata when a login issues a cookie rather than an
//! opaque bearer token.

/// Cookie attributes. `secure` should be `false` only in local
/// development over plain HTTP. `http_only` is `true` for the identity
/// cookie and `false` for the CSRF cookie — client-side script must be
/// able to read the latter to double-submit it as a query parameter.
#[derive(Debug, Clone)]
pub struct CookieOptions {
	pub name: String,
	pub path: String,
	pub secure: bool,
	pub http_only: bool,
	pub max_age_seconds: i64,
}

impl Default for CookieOptions {
	fn default() -> Self {
		Self { name: "pf-at".to_string(), path: "/".to_string(), secure: true, http_only: true, max_age_seconds: 3600 }
	}
}

impl CookieOptions {
	/// Options for the CSRF double-submit cookie: same transport
	/// attributes as the identity cookie, but readable by client script.
	pub fn csrf_defaults() -> Self {
		Self { name: "pf-ct".to_string(), http_only: false, ..Self::default() }
	}
}

/// Renders a `Set-Cookie` header value carrying `token` under `options`.
/// Always `SameSite=Lax`; `HttpOnly`/`Secure` are attached per `options`.
pub fn set_cookie_header(token: &str, options: &CookieOptions) -> String {
	let mut header =
		format!("{}={}; Path={}; Max-Age={}; SameSite=Lax", options.name, token, options.path, options.max_age_seconds);
	if options.http_only {
		header.push_str("; HttpOnly");
	}
	if options.secure {
		header.push_str("; Secure");
	}
	header
}

/// Renders a `Set-Cookie` header value that immediately expires the
/// cookie named by `options`, for logout.
pub fn clear_cookie_header(options: &CookieOptions) -> String {
	let mut header = format!("{}=; Path={}; Max-Age=0; SameSite=Lax", options.name, options.path);
	if options.http_only {
		header.push_str("; HttpOnly");
	}
	header
}

/// Extracts a named cookie's value from a raw `Cookie` header.
pub fn read_cookie(header: &str, name: &str) -> Option<String> {
	header.split(';').find_map(|pair| {
		let (key, value) = pair.trim().split_once('=')?;
		(key == name).then(|| value.to_string())
	})
}
