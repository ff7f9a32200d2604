use super::handlers::{
    admin::{institutions, stats, users},
    auth::{self, SessionGuard, require_role},
    colleges, health, root,
};
use axum::middleware;
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec. Routes added outside (like
/// `/` or `OPTIONS /health`) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    // Every route in this router runs behind the super-admin guard.
    let super_admin = OpenApiRouter::new()
        .routes(routes!(stats::dashboard_stats))
        .routes(routes!(users::list))
        .routes(routes!(users::create))
        .routes(routes!(users::set_role))
        .routes(routes!(users::set_status))
        .routes(routes!(institutions::list, institutions::create))
        .route_layer(middleware::from_fn_with_state(
            SessionGuard::super_admin(),
            require_role,
        ));

    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(health::debug_db))
        .routes(routes!(health::init_db))
        .routes(routes!(root::test))
        .routes(routes!(colleges::colleges))
        .routes(routes!(auth::login::login))
        .routes(routes!(auth::login::logout))
        .routes(routes!(auth::login::session))
        .merge(super_admin);

    let mut alumna_tag = Tag::new("alumna");
    alumna_tag.description = Some("Alumni management platform API".to_string());

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Liveness and database diagnostics".to_string());

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Universal login and sessions".to_string());

    let mut super_admin_tag = Tag::new("super-admin");
    super_admin_tag.description = Some("User and institution management".to_string());

    router.get_openapi_mut().tags = Some(vec![alumna_tag, health_tag, auth_tag, super_admin_tag]);

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    fn non_empty(value: &str) -> Option<&str> {
        if value.is_empty() { None } else { Some(value) }
    }
    match author.find('<') {
        Some(start) => {
            let email = author[start + 1..].trim_end_matches('>').trim();
            (non_empty(author[..start].trim()), non_empty(email))
        }
        None => (non_empty(author.trim()), None),
    }
}
