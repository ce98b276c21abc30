//! Singleton documents: contact details, biography, home page, author.
//!
//! Unlike the list collections these have exactly one instance. They are
//! fetched, merged onto defaults so every form field exists, edited locally
//! and saved back in one request.

use serde_json::{Map, Value, json};

use crate::api::{MultipartForm, RequestBody};
use crate::merge::{MergePolicy, Precedence};
use crate::record::DraftAttachment;

/// The singleton documents.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DocumentKind {
    Contact,
    #[strum(to_string = "biography", serialize = "bio")]
    Biography,
    Home,
    Author,
}

impl DocumentKind {
    pub fn spec(self) -> DocumentSpec {
        match self {
            DocumentKind::Contact => DocumentSpec::contact(),
            DocumentKind::Biography => DocumentSpec::biography(),
            DocumentKind::Home => DocumentSpec::home(),
            DocumentKind::Author => DocumentSpec::author(),
        }
    }
}

/// How a document is sent when saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEncoding {
    Json,
    /// Whole document as JSON text in a `data` part, plus any attached files.
    MultipartData,
}

/// A repeatable field of a document and its minimum length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatableField {
    pub name: &'static str,
    pub min_items: usize,
}

/// Where and how a document lives on the backend.
#[derive(Debug, Clone)]
pub struct DocumentSpec {
    pub name: String,
    pub fetch: String,
    pub save: String,
    pub encoding: DocumentEncoding,
    pub defaults: Map<String, Value>,
    pub policy: MergePolicy,
    pub repeatables: Vec<RepeatableField>,
    /// Multipart parts a file may be attached to.
    pub asset_parts: Vec<&'static str>,
}

impl DocumentSpec {
    pub fn new(
        name: impl Into<String>,
        fetch: impl Into<String>,
        save: impl Into<String>,
        encoding: DocumentEncoding,
    ) -> Self {
        Self {
            name: name.into(),
            fetch: fetch.into(),
            save: save.into(),
            encoding,
            defaults: Map::new(),
            policy: MergePolicy::default(),
            repeatables: Vec::new(),
            asset_parts: Vec::new(),
        }
    }

    pub fn defaults(mut self, defaults: Value) -> Self {
        if let Value::Object(map) = defaults {
            self.defaults = map;
        }
        self
    }

    pub fn policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn repeatable(mut self, name: &'static str, min_items: usize) -> Self {
        self.repeatables.push(RepeatableField { name, min_items });
        self
    }

    pub fn asset_parts(mut self, parts: &[&'static str]) -> Self {
        self.asset_parts = parts.to_vec();
        self
    }

    pub fn min_items(&self, field: &str) -> usize {
        self.repeatables
            .iter()
            .find(|r| r.name == field)
            .map(|r| r.min_items)
            .unwrap_or(0)
    }

    pub fn contact() -> Self {
        Self::new("Contact", "/contact/", "/contact/create", DocumentEncoding::Json)
            .defaults(json!({
                "officeAddress": "",
                "province": "Bagmati Province",
                "cityState": "Kathmandu, Nepal",
                "phoneNumbers": [{ "number": "", "type": "Office" }],
                "emails": [{ "address": "" }],
                "hoursSummary": "Sunday - Thursday: 10:00 AM - 5:00 PM",
                "closedDaysSummary": "Friday 10:00 AM - 3:00 PM",
                "Parking": "Available",
                "Accessible": "By Public Transport",
                "location": "Central",
                "visitHeading": "Our office is located in the heart of Kathmandu. We welcome scheduled visits.",
                "visitDescription": "Interactive Map\nKathmandu, Bagmati Province, Nepal",
                "footerGmail": "contact@girirajpokhrel.com",
                "footerPhone": "+977-1-4602290 (Koteshwor Party HQ)",
                "footerLocation": "Singha Durbar Complex, Central Kathmandu, Nepal"
            }))
            .repeatable("phoneNumbers", 1)
            .repeatable("emails", 1)
    }

    pub fn biography() -> Self {
        Self::new(
            "Biography",
            "/bio/getbio",
            "/bio/updatebio",
            DocumentEncoding::MultipartData,
        )
        .defaults(json!({
            "profile": {
                "firstName": "Giriraj Mani",
                "lastName": "Pokharel",
                "birthDate": "6 March 1958",
                "birthPlace": "Khotang, Nepal",
                "residence": "Kathmandu, Nepal",
                "photoUrl": ""
            },
            "biographyDesc": "",
            "stats": {
                "ministerialPositions": "2",
                "yearsInPolitics": "15+",
                "mpStatus": "Current"
            },
            "politicalPositionDesc": "A comprehensive overview of key political positions and roles held throughout his distinguished career.",
            "politicalPositions": [],
            "politicalAffiliations": [{ "name": "CPN (Maoist Centre)", "period": "since 2009" }],
            "keyAchievements": ["Former Minister of Education, Science and Technology"],
            "politicalLife": []
        }))
        .policy(MergePolicy::new(Precedence::PreferFetchedNonEmpty))
        .asset_parts(&["image"])
    }

    pub fn home() -> Self {
        Self::new(
            "Home",
            "/home/gethomedata",
            "/home/updatehomedata",
            DocumentEncoding::MultipartData,
        )
        .defaults(json!({
            "hero": {
                "tag": "",
                "firstName": "",
                "nameHighlight": "",
                "position": "",
                "description": "",
                "stats": [{ "years": "", "terms": "", "roles": "" }],
                "buttonData": [],
                "imageUrl": "",
                "captionName": "",
                "imageDesc": ""
            },
            "experience": {
                "headerTag": "",
                "headerHalfTitle": "",
                "headerHighlight": "",
                "headerDescription": "",
                "cards": [],
                "politicalFirstTitle": "",
                "politicalHighlightTitle": "",
                "politicalJourney": "",
                "timeline": []
            }
        }))
        .policy(MergePolicy::new(Precedence::PreferFetchedNonEmpty))
        .asset_parts(&["herosecimage"])
    }

    pub fn author() -> Self {
        Self::new(
            "Author",
            "/store/getauthor",
            "/store/author",
            DocumentEncoding::Json,
        )
        .defaults(json!({
            "aboutauthor": "",
            "authortags": [{ "role": "", "badge": "" }]
        }))
        .policy(MergePolicy::default().field("authortags", Precedence::PreferFetchedNonEmpty))
        .repeatable("authortags", 1)
    }

    /// Encodes a document for saving.
    pub fn save_body(
        &self,
        fields: &Map<String, Value>,
        attachments: &[DraftAttachment],
    ) -> RequestBody {
        match self.encoding {
            DocumentEncoding::Json => RequestBody::Json(Value::Object(fields.clone())),
            DocumentEncoding::MultipartData => {
                let mut form =
                    MultipartForm::new().text("data", Value::Object(fields.clone()).to_string());
                for a in attachments {
                    form = form.file(a.part.clone(), a.attachment.clone());
                }
                RequestBody::Multipart(form)
            }
        }
    }
}
