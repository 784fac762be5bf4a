use askama::Template;

use crate::store::ARTIFACT_EXTENSION;

/// XML namespace of the update-check response
pub const UPDATE_NAMESPACE: &str = "http://www.google.com/update2/response";
/// Protocol version the browser expects in the response envelope
pub const PROTOCOL_VERSION: &str = "2.0";
/// Version advertised for every served artifact
pub const ARTIFACT_VERSION: &str = "2.0";

const MANIFEST_EXTENSION: &str = "xml";

/// `<base><id>.xml`, the URL the browser polls for update info
pub fn manifest_url(base_url: &str, app_id: &str) -> String {
    resource_url(base_url, app_id, MANIFEST_EXTENSION)
}

/// `<base><id>.crx`, the URL the browser downloads the artifact from
pub fn artifact_url(base_url: &str, app_id: &str) -> String {
    resource_url(base_url, app_id, ARTIFACT_EXTENSION)
}

fn resource_url(base_url: &str, app_id: &str, extension: &str) -> String {
    let sep = if base_url.ends_with('/') { "" } else { "/" };
    format!("{}{}{}.{}", base_url, sep, app_id, extension)
}

/// Update-check response binding an app id to its download location
///
/// Generated per request and never stored. It is the whole of the update
/// protocol we speak: one app, one fixed version, one codebase URL.
#[derive(Template, Debug, Clone, PartialEq, Eq)]
#[template(path = "update.xml")]
pub struct UpdateManifest {
    namespace: &'static str,
    protocol: &'static str,
    app_id: String,
    codebase: String,
    version: &'static str,
}

impl UpdateManifest {
    pub fn new(app_id: impl Into<String>, base_url: &str) -> Self {
        let app_id = app_id.into();
        let codebase = artifact_url(base_url, &app_id);
        Self {
            namespace: UPDATE_NAMESPACE,
            protocol: PROTOCOL_VERSION,
            app_id,
            codebase,
            version: ARTIFACT_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "oogibonapbgdbnlooeegbgkeldobgmjl";

    #[test]
    fn test_render() {
        let manifest = UpdateManifest::new(ID, "http://127.0.0.1:777/");
        assert_eq!(
            manifest.render().unwrap(),
            "<gupdate xmlns='http://www.google.com/update2/response' protocol='2.0'>\
             <app appid='oogibonapbgdbnlooeegbgkeldobgmjl'>\
             <updatecheck codebase='http://127.0.0.1:777/oogibonapbgdbnlooeegbgkeldobgmjl.crx' version='2.0'/>\
             </app></gupdate>"
        );
    }

    #[test]
    fn test_urls_tolerate_missing_slash() {
        assert_eq!(
            manifest_url("http://localhost:8080", ID),
            format!("http://localhost:8080/{}.xml", ID)
        );
        assert_eq!(
            manifest_url("http://localhost:8080/", ID),
            format!("http://localhost:8080/{}.xml", ID)
        );
        assert_eq!(
            artifact_url("http://host/ext/", ID),
            format!("http://host/ext/{}.crx", ID)
        );
    }

    #[test]
    fn test_escapes_attributes() {
        let manifest = UpdateManifest::new("a'b<c", "http://h/");
        let xml = manifest.render().unwrap();
        assert!(xml.contains("b&lt;c'"));
        assert!(!xml.contains("a'b"));
        assert!(!xml.contains("<c"));
    }
}
