//! Server-rendered HTML pages.
//!
//! Pages are plain format! templates wrapped in a shared layout. All
//! user-controlled values go through [`html_escape`] before insertion.

use crate::cloudinary::{normalize_delivery_url, thumb_delivery_url, NormalizeOptions};
use crate::collection_store::{
    Card, CardWithList, List, ListWithCount, SearchFilters, CARD_TYPES, CONDITIONS, LANGUAGES,
};

const THUMB_SIZE: u32 = 80;

fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

fn layout(title: &str, authed: bool, body: &str) -> String {
    let session_controls = if authed {
        r#"<form method="POST" action="/logout" class="inline"><button type="submit">Log out</button></form>"#
            .to_string()
    } else {
        r#"<a href="/login">Owner login</a>"#.to_string()
    };

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
    <nav>
        <a href="/">My Lists</a>
        <a href="/search">Search</a>
        {session_controls}
    </nav>
    <main>
{body}
    </main>
</body>
</html>"##,
        title = html_escape(title),
        session_controls = session_controls,
        body = body,
    )
}

fn select_options(choices: &[&str], selected: Option<&str>) -> String {
    let mut options = String::from(r#"<option value=""></option>"#);
    for choice in choices {
        let selected_attr = if selected == Some(*choice) {
            " selected"
        } else {
            ""
        };
        options.push_str(&format!(
            r#"<option value="{value}"{selected}>{value}</option>"#,
            value = html_escape(choice),
            selected = selected_attr,
        ));
    }
    options
}

fn optional_int(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn home_page(lists: &[ListWithCount], authed: bool) -> String {
    let mut rows = String::new();
    for list in lists {
        let href = if authed {
            format!("/list/{}", list.id)
        } else {
            format!("/list/{}/view", list.id)
        };
        rows.push_str(&format!(
            "<tr><td><a href=\"{href}\">{name}</a></td><td>{count}</td></tr>\n",
            href = href,
            name = html_escape(&list.name),
            count = list.card_count,
        ));
    }

    let create_form = if authed {
        r##"<form method="POST" action="/lists">
    <input type="text" name="name" placeholder="New list name">
    <button type="submit">Create list</button>
</form>"##
            .to_string()
    } else {
        String::new()
    };

    let body = format!(
        r##"<h1>My Lists</h1>
<table>
    <tr><th>List</th><th>Cards</th></tr>
{rows}</table>
{create_form}"##,
        rows = rows,
        create_form = create_form,
    );
    layout("My Lists", authed, &body)
}

pub fn login_page(error: Option<&str>) -> String {
    let error_html = error
        .map(|message| format!("<p class=\"error\">{}</p>\n", html_escape(message)))
        .unwrap_or_default();
    let body = format!(
        r##"<h1>Owner login</h1>
{error_html}<form method="POST" action="/login">
    <input type="password" name="password" placeholder="Password">
    <button type="submit">Log in</button>
</form>"##,
        error_html = error_html,
    );
    layout("Login", false, &body)
}

fn card_form_fields(card: Option<&Card>) -> String {
    let name = card.map(|c| html_escape(&c.name)).unwrap_or_default();
    let card_number = card.map(|c| optional_int(c.card_number)).unwrap_or_default();
    let collection_total = card
        .map(|c| optional_int(c.collection_total))
        .unwrap_or_default();
    let grading_note = card.map(|c| optional_int(c.grading_note)).unwrap_or_default();
    let owned_checked = if card.is_some_and(|c| c.owned) {
        " checked"
    } else {
        ""
    };

    format!(
        r##"    <input type="text" name="name" value="{name}" placeholder="Card name">
    <input type="number" name="card_number" value="{card_number}" placeholder="Number">
    <input type="number" name="collection_total" value="{collection_total}" placeholder="Collection total">
    <select name="language">{languages}</select>
    <select name="condition">{conditions}</select>
    <select name="card_type">{card_types}</select>
    <input type="number" name="grading_note" value="{grading_note}" placeholder="Grading note">
    <label><input type="checkbox" name="owned"{owned_checked}> Owned</label>"##,
        name = name,
        card_number = card_number,
        collection_total = collection_total,
        grading_note = grading_note,
        owned_checked = owned_checked,
        languages = select_options(LANGUAGES, card.and_then(|c| c.language.as_deref())),
        conditions = select_options(CONDITIONS, card.and_then(|c| c.condition.as_deref())),
        card_types = select_options(CARD_TYPES, card.map(|c| c.card_type.as_str())),
    )
}

fn card_row(card: &Card, href: &str) -> String {
    format!(
        "<tr><td><img src=\"{thumb}\" alt=\"\" width=\"{size}\" height=\"{size}\"></td>\
         <td><a href=\"{href}\">{name}</a></td><td>{number}/{total}</td>\
         <td>{condition}</td><td>{owned}</td></tr>\n",
        thumb = html_escape(&thumb_delivery_url(&card.photo_url, THUMB_SIZE)),
        size = THUMB_SIZE,
        href = href,
        name = html_escape(&card.name),
        number = optional_int(card.card_number),
        total = optional_int(card.collection_total),
        condition = card.condition.as_deref().map(html_escape).unwrap_or_default(),
        owned = if card.owned { "✔" } else { "" },
    )
}

pub fn list_page(list: &List, cards: &[Card], editable: bool, authed: bool) -> String {
    let mut rows = String::new();
    for card in cards {
        let href = if editable {
            format!("/card/{}", card.id)
        } else {
            format!("/card/{}/view", card.id)
        };
        rows.push_str(&card_row(card, &href));
    }

    let owner_controls = if editable {
        format!(
            r##"<form method="POST" action="/list/{id}/rename">
    <input type="text" name="name" value="{name}">
    <button type="submit">Rename</button>
</form>
<h2>Add card</h2>
<form method="POST" action="/list/{id}/cards" enctype="multipart/form-data">
{fields}
    <input type="file" name="photo" accept="image/*">
    <button type="submit">Add card</button>
</form>"##,
            id = list.id,
            name = html_escape(&list.name),
            fields = card_form_fields(None),
        )
    } else {
        String::new()
    };

    let body = format!(
        r##"<h1>{name}</h1>
<table>
    <tr><th></th><th>Card</th><th>Number</th><th>Condition</th><th>Owned</th></tr>
{rows}</table>
{owner_controls}"##,
        name = html_escape(&list.name),
        rows = rows,
        owner_controls = owner_controls,
    );
    layout(&list.name, authed, &body)
}

pub fn card_page(entry: &CardWithList, editable: bool, authed: bool) -> String {
    let card = &entry.card;
    let photo = html_escape(&normalize_delivery_url(
        &card.photo_url,
        &NormalizeOptions::default(),
    ));

    let details = format!(
        r##"<img src="{photo}" alt="{name}">
<dl>
    <dt>List</dt><dd><a href="{list_href}">{list_name}</a></dd>
    <dt>Number</dt><dd>{number}/{total}</dd>
    <dt>Language</dt><dd>{language}</dd>
    <dt>Condition</dt><dd>{condition}</dd>
    <dt>Type</dt><dd>{card_type}</dd>
    <dt>Grading</dt><dd>{grading}</dd>
    <dt>Owned</dt><dd>{owned}</dd>
</dl>"##,
        photo = photo,
        name = html_escape(&card.name),
        list_href = if editable {
            format!("/list/{}", entry.list_id)
        } else {
            format!("/list/{}/view", entry.list_id)
        },
        list_name = html_escape(&entry.list_name),
        number = optional_int(card.card_number),
        total = optional_int(card.collection_total),
        language = card.language.as_deref().map(html_escape).unwrap_or_default(),
        condition = card.condition.as_deref().map(html_escape).unwrap_or_default(),
        card_type = html_escape(&card.card_type),
        grading = optional_int(card.grading_note),
        owned = if card.owned { "yes" } else { "no" },
    );

    let owner_controls = if editable {
        format!(
            r##"<h2>Edit</h2>
<form method="POST" action="/card/{id}" enctype="multipart/form-data">
{fields}
    <input type="file" name="photo" accept="image/*">
    <button type="submit">Save</button>
</form>
<form method="POST" action="/card/{id}/toggle" class="inline">
    <button type="submit">Toggle owned</button>
</form>
<form method="POST" action="/card/{id}?_method=DELETE" class="inline">
    <button type="submit">Delete</button>
</form>"##,
            id = card.id,
            fields = card_form_fields(Some(card)),
        )
    } else {
        String::new()
    };

    let body = format!(
        "<h1>{name}</h1>\n{details}\n{owner_controls}",
        name = html_escape(&card.name),
        details = details,
        owner_controls = owner_controls,
    );
    layout(&card.name, authed, &body)
}

pub fn search_page(results: &[CardWithList], filters: &SearchFilters, authed: bool) -> String {
    let filter_form = format!(
        r##"<form method="GET" action="/search">
    <input type="text" name="q" value="{q}" placeholder="Card name">
    <select name="condition">{conditions}</select>
    <select name="language">{languages}</select>
    <select name="card_type">{card_types}</select>
    <select name="owned">
        <option value=""></option>
        <option value="true"{owned_true}>Owned</option>
        <option value="false"{owned_false}>Not owned</option>
    </select>
    <input type="number" name="grading_min" value="{grading_min}" placeholder="Grading min">
    <input type="number" name="grading_max" value="{grading_max}" placeholder="Grading max">
    <button type="submit">Search</button>
</form>"##,
        q = html_escape(filters.q.as_deref().unwrap_or("")),
        conditions = select_options(CONDITIONS, filters.condition.as_deref()),
        languages = select_options(LANGUAGES, filters.language.as_deref()),
        card_types = select_options(CARD_TYPES, filters.card_type.as_deref()),
        owned_true = if filters.owned.as_deref() == Some("true") {
            " selected"
        } else {
            ""
        },
        owned_false = if filters.owned.as_deref() == Some("false") {
            " selected"
        } else {
            ""
        },
        grading_min = html_escape(filters.grading_min.as_deref().unwrap_or("")),
        grading_max = html_escape(filters.grading_max.as_deref().unwrap_or("")),
    );

    let mut rows = String::new();
    for entry in results {
        let href = if authed {
            format!("/card/{}", entry.card.id)
        } else {
            format!("/card/{}/view", entry.card.id)
        };
        rows.push_str(&format!(
            "<tr><td><img src=\"{thumb}\" alt=\"\" width=\"{size}\" height=\"{size}\"></td>\
             <td><a href=\"{href}\">{name}</a></td><td>{list}</td><td>{condition}</td>\
             <td>{grading}</td><td>{owned}</td></tr>\n",
            thumb = html_escape(&thumb_delivery_url(&entry.card.photo_url, THUMB_SIZE)),
            size = THUMB_SIZE,
            href = href,
            name = html_escape(&entry.card.name),
            list = html_escape(&entry.list_name),
            condition = entry
                .card
                .condition
                .as_deref()
                .map(html_escape)
                .unwrap_or_default(),
            grading = optional_int(entry.card.grading_note),
            owned = if entry.card.owned { "✔" } else { "" },
        ));
    }

    let body = format!(
        r##"<h1>Search</h1>
{filter_form}
<p>{count} result(s)</p>
<table>
    <tr><th></th><th>Card</th><th>List</th><th>Condition</th><th>Grading</th><th>Owned</th></tr>
{rows}</table>"##,
        filter_form = filter_form,
        count = results.len(),
        rows = rows,
    );
    layout("Search", authed, &body)
}
