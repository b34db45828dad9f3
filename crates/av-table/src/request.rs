//! Table request construction
//!
//! Pure builder functions producing a [`TableRequest`] from search
//! parameters.  Every builder injects a unique `tbl_id` (from an injected
//! [`IdGenerator`], so tests control id sequencing) and a `META_INFO` map
//! carrying at least the title and tbl_id.  Unset keys are omitted from the
//! serialized request; callers rely on absence, not null, to mean "unset".

use ahash::AHashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default page size injected by the request builders.
pub const DEF_PAGE_SIZE: usize = 100;

const META_TITLE: &str = "title";
const META_TBL_ID: &str = "tbl_id";

/// A table request, sent to the fetch collaborator as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRequest {
    /// Search processor id.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tbl_id: Option<String>,
    #[serde(rename = "startIdx", default)]
    pub start_idx: usize,
    #[serde(rename = "pageSize", default)]
    pub page_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
    #[serde(rename = "sortInfo", default, skip_serializing_if = "Option::is_none")]
    pub sort_info: Option<String>,
    #[serde(rename = "inclCols", default, skip_serializing_if = "Option::is_none")]
    pub incl_cols: Option<String>,
    #[serde(rename = "META_INFO", default, skip_serializing_if = "IndexMap::is_empty")]
    pub meta_info: IndexMap<String, String>,
    /// Processor-specific parameters.
    #[serde(flatten)]
    pub params: IndexMap<String, Value>,
}

impl TableRequest {
    /// Route a free-form key to its typed field, or into `params`.
    /// Null values are dropped rather than stored.
    pub fn set_param(&mut self, key: &str, value: Value) {
        if value.is_null() {
            return;
        }
        match key {
            "startIdx" => self.start_idx = value.as_u64().unwrap_or(0) as usize,
            "pageSize" => self.page_size = value.as_u64().unwrap_or(DEF_PAGE_SIZE as u64) as usize,
            "filters" => self.filters = value.as_str().map(String::from),
            "sortInfo" => self.sort_info = value.as_str().map(String::from),
            "inclCols" => self.incl_cols = value.as_str().map(String::from),
            _ => {
                self.params.insert(key.to_string(), value);
            }
        }
    }

    fn merge_params(&mut self, params: IndexMap<String, Value>) {
        for (k, v) in params {
            self.set_param(&k, v);
        }
    }
}

/// Search-area parameters for the catalog request builders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "SearchMethod")]
pub enum SearchParams {
    Cone {
        position: String,
        /// Radius of the search in arcsec.
        radius: f64,
    },
    Box {
        position: String,
        /// Length of a side, in arcsec.
        size: f64,
    },
    #[serde(rename = "Eliptical")]
    Elliptical {
        position: String,
        radius: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        radunits: Option<String>,
        ratio: f64,
        posang: f64,
    },
}

impl SearchParams {
    /// The search position, folded into the request as `UserTargetWorldPt`.
    pub fn position(&self) -> &str {
        match self {
            SearchParams::Cone { position, .. }
            | SearchParams::Box { position, .. }
            | SearchParams::Elliptical { position, .. } => position,
        }
    }

    /// Flatten into request parameters, skipping the position key.
    fn to_params(&self) -> IndexMap<String, Value> {
        let mut map: IndexMap<String, Value> = match serde_json::to_value(self) {
            Ok(Value::Object(m)) => m.into_iter().collect(),
            _ => IndexMap::new(),
        };
        map.shift_remove("position");
        map
    }
}

/// Generator for unique table ids, scoped to one connection.  Collision
/// checks are against the ids the generator has already seen; foreign ids
/// can be registered with [`IdGenerator::mark_known`].
#[derive(Debug, Default)]
pub struct IdGenerator {
    conn_id: String,
    next: u64,
    known: AHashSet<String>,
}

impl IdGenerator {
    pub fn new(conn_id: &str) -> Self {
        Self {
            conn_id: conn_id.to_string(),
            ..Default::default()
        }
    }

    /// Register an id created elsewhere so it is never handed out again.
    pub fn mark_known(&mut self, id: &str) {
        self.known.insert(id.to_string());
    }

    /// Next unique table id.
    pub fn unique_tbl_id(&mut self) -> String {
        self.unique_with_prefix("tbl_id")
    }

    /// Next unique table UI id.
    pub fn unique_tbl_ui_id(&mut self) -> String {
        self.unique_with_prefix("tbl_ui_id")
    }

    fn unique_with_prefix(&mut self, prefix: &str) -> String {
        loop {
            let id = format!("{}-c{}-{}", prefix, self.conn_id, self.next);
            self.next += 1;
            if self.known.insert(id.clone()) {
                return id;
            }
        }
    }
}

fn base_request(ids: &mut IdGenerator, id: &str, title: &str, mut options: TableRequest) -> TableRequest {
    let tbl_id = options.tbl_id.take().unwrap_or_else(|| ids.unique_tbl_id());
    options.id = id.to_string();
    if options.page_size == 0 {
        options.page_size = DEF_PAGE_SIZE;
    }
    options.meta_info.insert(META_TITLE.to_string(), title.to_string());
    options.meta_info.insert(META_TBL_ID.to_string(), tbl_id.clone());
    options.tbl_id = Some(tbl_id);
    options
}

/// Create a table request for the given search processor id.
pub fn make_tbl_request(
    ids: &mut IdGenerator,
    id: &str,
    title: Option<&str>,
    params: IndexMap<String, Value>,
    options: TableRequest,
) -> TableRequest {
    let title = title.unwrap_or(id).to_string();
    let mut req = base_request(ids, id, &title, options);
    req.merge_params(params);
    req
}

/// Create a request for tabular data from a file.  The source may be a url
/// or an absolute path on the server.
pub fn make_file_request(
    ids: &mut IdGenerator,
    title: Option<&str>,
    source: &str,
    alt_source: Option<&str>,
    options: TableRequest,
) -> TableRequest {
    let title = title.unwrap_or(source).to_string();
    let mut req = base_request(ids, "IpacTableFromSource", &title, options);
    req.set_param("source", Value::from(source));
    if let Some(alt) = alt_source {
        req.set_param("alt_source", Value::from(alt));
    }
    req
}

/// Create the request to query IRSA catalogs.
pub fn make_irsa_catalog_request(
    ids: &mut IdGenerator,
    title: Option<&str>,
    project: &str,
    catalog: &str,
    params: &SearchParams,
    options: TableRequest,
) -> TableRequest {
    let title = title.unwrap_or(catalog).to_string();
    let mut req = base_request(ids, "GatorQuery", &title, options);
    if !req.params.contains_key("use") {
        req.set_param("use", Value::from("catalog_overlay"));
    }
    req.set_param("UserTargetWorldPt", Value::from(params.position()));
    req.set_param("catalogProject", Value::from(project));
    req.set_param("catalog", Value::from(catalog));
    req.merge_params(params.to_params());
    req
}

/// Create the request to query a VO cone-search service.
pub fn make_vo_catalog_request(
    ids: &mut IdGenerator,
    title: &str,
    params: &SearchParams,
    options: TableRequest,
) -> TableRequest {
    let mut req = base_request(ids, "ConeSearchByURL", title, options);
    if !req.params.contains_key("use") {
        req.set_param("use", Value::from("catalog_overlay"));
    }
    req.set_param("UserTargetWorldPt", Value::from(params.position()));
    req.merge_params(params.to_params());
    req
}

/// Deep-clone a request without its identity: `tbl_id` and
/// `META_INFO.tbl_id` are stripped so the clone is not treated as referring
/// to the same table, then `params` are merged on top.
pub fn clone_request(request: &TableRequest, params: IndexMap<String, Value>) -> TableRequest {
    let mut req = request.clone();
    req.tbl_id = None;
    req.meta_info.shift_remove(META_TBL_ID);
    req.merge_params(params);
    req
}
