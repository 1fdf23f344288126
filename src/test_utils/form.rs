use scraper::{ElementRef, Html, Selector};

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("No form found")
}

#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let hx_attribute = form
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("{attribute} attribute missing"));

    assert_eq!(
        hx_attribute, endpoint,
        "want form with attribute {attribute}=\"{endpoint}\", got {hx_attribute:?}"
    );
}

/// Assert that `form` has an input named `name` of type `type_`.
///
/// If `value` is given, the input must also have that value.
#[track_caller]
pub(crate) fn assert_form_input(
    form: &ElementRef<'_>,
    name: &str,
    type_: &str,
    value: Option<&str>,
) {
    for input in form.select(&Selector::parse("input").unwrap()) {
        let input_name = input.value().attr("name").unwrap_or_default();
        let input_type = input.value().attr("type").unwrap_or_default();

        if input_name != name || input_type != type_ {
            continue;
        }

        if let Some(value) = value {
            let input_value = input.value().attr("value").unwrap_or_default();
            if input_value != value {
                continue;
            }
        }

        return;
    }

    panic!("No input found with name \"{name}\", type \"{type_}\" and value {value:?}");
}

/// Assert that `form` has a select named `name` with `selected` as the selected option.
#[track_caller]
pub(crate) fn assert_form_select(form: &ElementRef<'_>, name: &str, selected: &str) {
    let select = form
        .select(&Selector::parse(&format!("select[name={name}]")).unwrap())
        .next()
        .unwrap_or_else(|| panic!("No select found with name \"{name}\""));

    let selected_value = select
        .select(&Selector::parse("option[selected]").unwrap())
        .next()
        .and_then(|option| option.value().attr("value"))
        .unwrap_or_default();

    assert_eq!(
        selected_value, selected,
        "want select {name} to have {selected:?} selected, got {selected_value:?}"
    );
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef<'_>) {
    let submit_button = form
        .select(&Selector::parse("button[type=submit]").unwrap())
        .next()
        .expect("No submit button found");

    assert!(!submit_button.text().collect::<String>().trim().is_empty());
}
