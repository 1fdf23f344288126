#![allow(missing_docs)]

pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

use rusqlite::Connection;

use crate::db::initialize;

pub(crate) use form::{
    assert_form_input, assert_form_select, assert_form_submit_button, assert_hx_endpoint,
    must_get_form,
};
pub(crate) use html::{assert_valid_html, parse_html_document, parse_html_fragment};
pub(crate) use http::{
    assert_content_type, assert_hx_redirect, assert_status_ok, get_header, parse_json,
};

/// An in-memory database with every table created and the defaults seeded.
#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let conn = Connection::open_in_memory().expect("could not open in-memory database");
    initialize(&conn).expect("could not initialize database");
    conn
}
