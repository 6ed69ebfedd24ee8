// Leaflet web map
//   One self-contained page: OSM basemap, one image overlay per layer with its
//   PNG inlined as a data URL, a colorbar per layer and a layer control.

use super::{MapDocument, MapLayer};

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const OSM_TILES: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
const OSM_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Quoted JavaScript string literal, safe inside a script element
pub fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string())
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
}

fn legend(layer: &MapLayer) -> String {
    format!(
        r#"        <div class="colorbar">
            <div class="colorbar-title">{title}</div>
            <div class="colorbar-ramp" style="background: {gradient};"></div>
            <div class="colorbar-labels"><span>{min}</span><span>{max}</span></div>
        </div>
"#,
        title = escape_html(layer.label()),
        gradient = layer.ramp().css_gradient(),
        min = layer.ramp().min(),
        max = layer.ramp().max(),
    )
}

fn overlay(index: usize, layer: &MapLayer) -> String {
    let (west, south, east, north) = layer.bounds().as_tuple();
    format!(
        r#"        var bounds{index} = [[{south}, {west}], [{north}, {east}]];
        var layer{index} = L.imageOverlay('{url}', bounds{index}, {{
            opacity: 1.0,
            interactive: false,
        }}).addTo(map);
        overlays[{name}] = layer{index};
"#,
        url = layer.data_url(),
        name = js_string(layer.name()),
    )
}

pub fn render_html(document: &MapDocument) -> String {
    let (center, zoom) = document.view();
    let mut legends = String::new();
    let mut overlays = String::new();
    for (i, layer) in document.layers().iter().enumerate() {
        legends.push_str(&legend(layer));
        overlays.push_str(&overlay(i, layer));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8" />
    <title>{title}</title>
    <link rel="stylesheet" href="{LEAFLET_CSS}" />
    <script src="{LEAFLET_JS}"></script>
    <style>
        body {{margin: 0;}}
        #map {{width: {width}; height: {height};}}
        #legend {{
            position: absolute;
            bottom: 30px;
            right: 10px;
            z-index: 1000;
            background: white;
            padding: 8px 10px;
            border-radius: 5px;
            opacity: 85%;
            font: 12px sans-serif;
        }}
        .colorbar {{width: 220px; margin: 4px 0;}}
        .colorbar-title {{font-weight: bold; margin-bottom: 2px;}}
        .colorbar-ramp {{height: 12px; border: 1px solid #777;}}
        .colorbar-labels {{display: flex; justify-content: space-between;}}
        #opacity-slider {{
            display: flex;
            position: absolute;
            bottom: 0px;
            left: 0px;
            width: 40%;
            z-index: 1000;
            background: white;
            padding: 10px;
            border-radius: 5px;
            opacity: 70%;
        }}
        #opacity{{flex: 1;}}
    </style>
</head>
<body>
    <div id="map"></div>
    <div id="legend">
{legends}    </div>
    <div id="opacity-slider">
        <label for="opacity">Opacity: </label>
        <input type="range" id="opacity" min="0" max="1" step="0.02" value="1">
    </div>
    <script>
        // Leaflet map
        var map = L.map('map').setView([{lat}, {lon}], {zoom});

        // OSM basemap layer
        var osm = L.tileLayer('{OSM_TILES}', {{
            attribution: '{OSM_ATTRIBUTION}'
        }}).addTo(map);

        // Index layers
        var overlays = {{}};
{overlays}
        L.control.layers({{'OpenStreetMap': osm}}, overlays).addTo(map);

        // Opacity
        document.getElementById('opacity').addEventListener('input', function() {{
            for (var name in overlays) {{
                overlays[name].setOpacity(this.value);
            }}
        }});
    </script>
</body>
</html>
"#,
        title = escape_html(document.title()),
        width = escape_html(document.width()),
        height = escape_html(document.height()),
        lat = center.0,
        lon = center.1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping() {
        assert_eq!(
            escape_html("<b>\"NDVI\" & 'NDWI'</b>"),
            "&lt;b&gt;&quot;NDVI&quot; &amp; &#39;NDWI&#39;&lt;/b&gt;"
        );
        assert_eq!(js_string("a'b\"</script>"), "\"a'b\\\"\\u003c/script\\u003e\"");
    }

    #[test]
    fn empty_document() {
        let html = render_html(&MapDocument::new("Empty <map>"));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Empty &lt;map&gt;</title>"));
        assert!(html.contains("setView([0, 0], 2)"));
        assert!(html.contains("L.control.layers"));
        assert!(!html.contains("imageOverlay"));
    }
}
