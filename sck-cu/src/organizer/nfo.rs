//! NFO sidecar generation (Kodi/Jellyfin `movie` schema)

use chrono::{Datelike, NaiveDate};
use quick_xml::events::{BytesCData, BytesDecl, BytesText, Event};
use quick_xml::Writer;
use sck_common::Scene;

/// Render the NFO document for a scene
pub fn scene_nfo(scene: &Scene) -> quick_xml::Result<String> {
    let title = scene.title.as_deref().unwrap_or("");
    let (critic_rating, rating) = match scene.rating {
        Some(r) if r > 0 => (
            r.to_string(),
            ((r as f64) / 10.0).round().to_string(),
        ),
        _ => (String::new(), String::new()),
    };
    let date = scene.date.as_deref().unwrap_or("");
    let year = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.year().to_string())
        .unwrap_or_default();
    let studio = scene
        .studio
        .as_ref()
        .map(|s| s.name.as_str())
        .unwrap_or("UNKNOWN");
    let plot = scene.details.as_deref().unwrap_or("");

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.create_element("movie").write_inner_content(|w| {
        for name in ["name", "title", "originaltitle", "sorttitle"] {
            text_element(w, name, title)?;
        }
        text_element(w, "criticrating", &critic_rating)?;
        text_element(w, "rating", &rating)?;
        text_element(w, "userrating", &rating)?;
        // CDATA cannot carry its own terminator
        if plot.contains("]]>") {
            text_element(w, "plot", plot)?;
        } else {
            w.create_element("plot")
                .write_cdata_content(BytesCData::new(plot))?;
        }
        text_element(w, "premiered", date)?;
        text_element(w, "releasedate", date)?;
        text_element(w, "year", &year)?;
        text_element(w, "studio", studio)?;

        for (order, performer) in scene.performers.iter().enumerate() {
            w.create_element("actor").write_inner_content(|a| {
                text_element(a, "name", &performer.name)?;
                text_element(a, "role", &performer.name)?;
                text_element(a, "order", &order.to_string())
            })?;
        }

        text_element(w, "genre", "Adult")?;
        for tag in &scene.tags {
            text_element(w, "tag", &tag.name)?;
        }
        w.create_element("uniqueid")
            .with_attribute(("type", "stash"))
            .write_text_content(BytesText::new(&scene.id))?;
        Ok::<(), quick_xml::Error>(())
    })?;

    let mut xml = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    xml.push('\n');
    Ok(xml)
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> quick_xml::Result<()> {
    writer
        .create_element(name)
        .write_text_content(BytesText::new(value))?;
    Ok(())
}
