use std::time::Duration;

pub(crate) const PAGE_HEADING: &str = "HomeChance Dashboard";
pub(crate) const GRAPH_ELEMENT_ID: &str = "graph";

/// Renders the dashboard layout with the current chart inlined.
///
/// The embedded script posts `{n_intervals}` to `/_dash-update` every
/// `refresh_interval` and swaps the returned SVG into the graph element.
pub(crate) fn render_index(chart_svg: &str, refresh_interval: Duration) -> String {
    let interval_ms = u64::try_from(refresh_interval.as_millis()).unwrap_or(u64::MAX);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{heading}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
#{graph} svg {{ max-width: 100%; height: auto; }}
</style>
</head>
<body>
<h1>{heading}</h1>
<div id="{graph}">{chart}</div>
<script>
(function () {{
  var nIntervals = 0;
  var graph = document.getElementById("{graph}");
  setInterval(function () {{
    nIntervals += 1;
    fetch("/_dash-update", {{
      method: "POST",
      headers: {{ "Content-Type": "application/json" }},
      body: JSON.stringify({{ n_intervals: nIntervals }})
    }}).then(function (response) {{
      if (!response.ok) {{ return null; }}
      return response.text();
    }}).then(function (svg) {{
      if (svg) {{ graph.innerHTML = svg; }}
    }}).catch(function () {{}});
  }}, {interval_ms});
}})();
</script>
</body>
</html>
"#,
        heading = PAGE_HEADING,
        graph = GRAPH_ELEMENT_ID,
        chart = chart_svg,
        interval_ms = interval_ms,
    )
}
