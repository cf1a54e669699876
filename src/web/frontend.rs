//! Embedded HTML/CSS/JS frontend for the mallscope dashboard.
//!
//! The entire page is compiled into the binary as a string constant and
//! draws the chart specs from `/api/charts` as inline SVG. No external
//! assets, no build tools, no CDN dependencies.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Mall Customer Dashboard</title>
<style>
:root {
  --bg: #f7fbf9;
  --surface: #ffffff;
  --border: #d9ece4;
  --text: #2f3e46;
  --text-muted: #6c7a80;
  --accent: #78c2ad;
  --accent-dark: #5aa892;
  --warn: #f3969a;
  --radius: 10px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 1280px; margin: 0 auto; padding: 24px; }

h1 { text-align: center; font-size: 28px; font-weight: 600; margin: 8px 0 24px; }

.row {
  display: grid;
  grid-template-columns: repeat(auto-fit, minmax(320px, 1fr));
  gap: 16px;
  margin-bottom: 16px;
}

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 16px;
}

label.title { display: block; font-weight: 600; margin-bottom: 8px; }

.chips { display: flex; flex-wrap: wrap; gap: 8px; }
.chip {
  padding: 4px 12px;
  border: 1px solid var(--accent);
  border-radius: 14px;
  cursor: pointer;
  user-select: none;
  color: var(--accent-dark);
}
.chip.on { background: var(--accent); color: #fff; }
.hint { color: var(--text-muted); font-size: 12px; margin-top: 6px; }

input[type=range] { width: 100%; accent-color: var(--accent); }
.marks { position: relative; height: 18px; font-size: 11px; color: var(--text-muted); }
.marks span { position: absolute; transform: translateX(-50%); }

textarea {
  width: 100%;
  height: 80px;
  padding: 8px;
  border: 1px solid var(--border);
  border-radius: 6px;
  font-family: var(--font);
  resize: vertical;
}

button.ask {
  margin-top: 8px;
  padding: 6px 16px;
  border: none;
  border-radius: 6px;
  background: var(--accent);
  color: #fff;
  font-weight: 600;
  cursor: pointer;
}
button.ask:disabled { background: var(--border); cursor: wait; }

#answer { margin-top: 12px; white-space: pre-wrap; }
#answer.error { color: var(--warn); }

.chart h2 { font-size: 15px; font-weight: 600; margin-bottom: 8px; }
.chart svg { width: 100%; height: 320px; display: block; }
.legend { display: flex; gap: 12px; font-size: 12px; margin-top: 4px; }
.legend i { display: inline-block; width: 10px; height: 10px; border-radius: 50%; margin-right: 4px; }
.empty { fill: var(--text-muted); font-size: 13px; }
.axis { stroke: #b8c7c1; }
.tick { fill: var(--text-muted); font-size: 10px; }
.status { text-align: center; color: var(--text-muted); font-size: 12px; margin-bottom: 12px; }
</style>
</head>
<body>
<div class="app">
  <h1>Customer Segmentation Dashboard</h1>

  <div class="row">
    <div class="card">
      <label class="title">Gender</label>
      <div class="chips" id="gender-filter"></div>
      <div class="hint">No selection shows every gender.</div>
    </div>
    <div class="card">
      <label class="title">Minimum age: <span id="age-value">-</span></label>
      <input type="range" id="age-slider" step="1">
      <div class="marks" id="age-marks"></div>
    </div>
    <div class="card">
      <label class="title" for="user-question">Ask the assistant</label>
      <textarea id="user-question" placeholder="e.g. Which type of customer spends the most?"></textarea>
      <button class="ask" id="ask-button">Ask</button>
      <div id="answer"></div>
    </div>
  </div>

  <div class="status" id="status"></div>

  <div class="row">
    <div class="card chart"><h2 id="scatter-title"></h2><svg id="scatter"></svg><div class="legend" id="scatter-legend"></div></div>
    <div class="card chart"><h2 id="box_plot-title"></h2><svg id="box_plot"></svg></div>
  </div>
  <div class="row">
    <div class="card chart"><h2 id="histogram-title"></h2><svg id="histogram"></svg></div>
    <div class="card chart"><h2 id="bar-title"></h2><svg id="bar"></svg></div>
  </div>
</div>

<script>
const PALETTE = ['#78c2ad', '#f3969a', '#6cc3d5', '#ffce67', '#a991d4', '#56cc9d'];
const W = 560, H = 320, M = { l: 48, r: 12, t: 12, b: 40 };
const SVG_NS = 'http://www.w3.org/2000/svg';

const state = {
  genders: [], minAge: null, clicks: 0, colors: {},
  client: 'page-' + Date.now().toString(36) + '-' + Math.random().toString(36).slice(2, 10),
};

function el(tag, attrs, text) {
  const node = document.createElementNS(SVG_NS, tag);
  for (const [k, v] of Object.entries(attrs || {})) node.setAttribute(k, v);
  if (text !== undefined) node.textContent = text;
  return node;
}

function colorFor(name) {
  if (!(name in state.colors)) {
    state.colors[name] = PALETTE[Object.keys(state.colors).length % PALETTE.length];
  }
  return state.colors[name];
}

function niceTicks(min, max, count) {
  if (max <= min) return [min];
  const step = Math.pow(10, Math.floor(Math.log10((max - min) / count)));
  const mult = [1, 2, 5, 10].find(m => (max - min) / (step * m) <= count) || 10;
  const s = step * mult;
  const out = [];
  for (let v = Math.ceil(min / s) * s; v <= max + 1e-9; v += s) out.push(+v.toFixed(6));
  return out;
}

// Draw axes and return scale functions for a numeric x/y plot.
function frame(svg, spec, xMin, xMax, yMin, yMax, xTicks) {
  svg.setAttribute('viewBox', `0 0 ${W} ${H}`);
  svg.replaceChildren();
  const sx = v => M.l + (xMax === xMin ? 0.5 : (v - xMin) / (xMax - xMin)) * (W - M.l - M.r);
  const sy = v => H - M.b - (yMax === yMin ? 0.5 : (v - yMin) / (yMax - yMin)) * (H - M.t - M.b);
  svg.append(el('line', { x1: M.l, y1: H - M.b, x2: W - M.r, y2: H - M.b, class: 'axis' }));
  svg.append(el('line', { x1: M.l, y1: M.t, x2: M.l, y2: H - M.b, class: 'axis' }));
  for (const t of niceTicks(yMin, yMax, 6)) {
    svg.append(el('text', { x: M.l - 6, y: sy(t) + 3, 'text-anchor': 'end', class: 'tick' }, t));
  }
  if (xTicks) {
    for (const t of niceTicks(xMin, xMax, 8)) {
      svg.append(el('text', { x: sx(t), y: H - M.b + 14, 'text-anchor': 'middle', class: 'tick' }, t));
    }
  }
  svg.append(el('text', { x: (W + M.l) / 2, y: H - 6, 'text-anchor': 'middle', class: 'tick' }, spec.x_label));
  svg.append(el('text', { x: 12, y: H / 2, transform: `rotate(-90 12 ${H / 2})`, 'text-anchor': 'middle', class: 'tick' }, spec.y_label));
  return { sx, sy };
}

function drawEmpty(svg) {
  svg.setAttribute('viewBox', `0 0 ${W} ${H}`);
  svg.replaceChildren(el('text', { x: W / 2, y: H / 2, 'text-anchor': 'middle', class: 'empty' }, 'No data for this selection'));
}

function drawScatter(svg, spec) {
  const legend = document.getElementById('scatter-legend');
  legend.replaceChildren();
  const pts = spec.series.flatMap(s => s.points);
  if (pts.length === 0) return drawEmpty(svg);
  const xs = pts.map(p => p.x), ys = pts.map(p => p.y);
  const { sx, sy } = frame(svg, spec, Math.min(...xs), Math.max(...xs), Math.min(0, ...ys), Math.max(...ys), true);
  for (const s of spec.series) {
    const color = colorFor(s.name);
    for (const p of s.points) {
      const c = el('circle', { cx: sx(p.x), cy: sy(p.y), r: 4, fill: color, 'fill-opacity': 0.75 });
      c.append(el('title', {}, `${s.name}: ${p.x}, ${p.y}`));
      svg.append(c);
    }
    const item = document.createElement('span');
    item.innerHTML = `<i style="background:${color}"></i>`;
    item.append(s.name);
    legend.append(item);
  }
}

function drawBox(svg, spec) {
  if (spec.groups.length === 0) return drawEmpty(svg);
  const lo = Math.min(0, ...spec.groups.map(g => g.min));
  const hi = Math.max(...spec.groups.map(g => g.max));
  const { sy } = frame(svg, spec, 0, 1, lo, hi, false);
  const slot = (W - M.l - M.r) / spec.groups.length;
  spec.groups.forEach((g, i) => {
    const cx = M.l + slot * (i + 0.5), bw = Math.min(80, slot * 0.5);
    const color = colorFor(g.name);
    svg.append(el('line', { x1: cx, y1: sy(g.min), x2: cx, y2: sy(g.max), stroke: color }));
    const box = el('rect', { x: cx - bw / 2, y: sy(g.q3), width: bw, height: Math.max(1, sy(g.q1) - sy(g.q3)), fill: color, 'fill-opacity': 0.35, stroke: color });
    box.append(el('title', {}, `${g.name} (n=${g.count})\nmin ${g.min}  q1 ${g.q1}  median ${g.median}  q3 ${g.q3}  max ${g.max}`));
    svg.append(box);
    svg.append(el('line', { x1: cx - bw / 2, y1: sy(g.median), x2: cx + bw / 2, y2: sy(g.median), stroke: color, 'stroke-width': 2 }));
    for (const v of [g.min, g.max]) {
      svg.append(el('line', { x1: cx - bw / 4, y1: sy(v), x2: cx + bw / 4, y2: sy(v), stroke: color }));
    }
    svg.append(el('text', { x: cx, y: H - M.b + 14, 'text-anchor': 'middle', class: 'tick' }, g.name));
  });
}

function drawHistogram(svg, spec) {
  if (spec.bins.length === 0) return drawEmpty(svg);
  const top = Math.max(1, ...spec.bins.map(b => b.count));
  const { sx, sy } = frame(svg, spec, spec.bins[0].start, spec.bins[spec.bins.length - 1].end, 0, top, true);
  for (const b of spec.bins) {
    const r = el('rect', { x: sx(b.start) + 1, y: sy(b.count), width: Math.max(1, sx(b.end) - sx(b.start) - 2), height: sy(0) - sy(b.count), fill: PALETTE[0] });
    r.append(el('title', {}, `${b.start.toFixed(1)}–${b.end.toFixed(1)}: ${b.count}`));
    svg.append(r);
  }
}

function drawBar(svg, spec) {
  if (spec.bars.length === 0) return drawEmpty(svg);
  const { sy } = frame(svg, spec, 0, 1, 0, Math.max(1, ...spec.bars.map(b => b.count)), false);
  const slot = (W - M.l - M.r) / spec.bars.length;
  spec.bars.forEach((b, i) => {
    const x = M.l + slot * i + slot * 0.2;
    const r = el('rect', { x, y: sy(b.count), width: slot * 0.6, height: sy(0) - sy(b.count), fill: colorFor(b.label) });
    r.append(el('title', {}, `${b.label}: ${b.count}`));
    svg.append(r);
    svg.append(el('text', { x: x + slot * 0.3, y: H - M.b + 14, 'text-anchor': 'middle', class: 'tick' }, b.label));
  });
}

const DRAW = { scatter: drawScatter, box: drawBox, histogram: drawHistogram, bar: drawBar };

async function refreshCharts() {
  const params = new URLSearchParams();
  state.genders.forEach(g => params.append('gender', g));
  if (state.minAge !== null) params.set('min_age', state.minAge);
  const res = await fetch('/api/charts?' + params.toString());
  const data = await res.json();
  if (!res.ok) {
    document.getElementById('status').textContent = data.error || 'failed to load charts';
    return;
  }
  document.getElementById('status').textContent = `${data.matched} of ${data.total} customers`;
  for (const [id, spec] of Object.entries(data.charts)) {
    document.getElementById(id + '-title').textContent = spec.title;
    DRAW[spec.kind](document.getElementById(id), spec);
  }
}

async function loadOptions() {
  const res = await fetch('/api/options');
  const opts = await res.json();
  opts.genders.forEach(colorFor);

  const chips = document.getElementById('gender-filter');
  for (const g of opts.genders) {
    const chip = document.createElement('span');
    chip.className = 'chip';
    chip.textContent = g;
    chip.onclick = () => {
      chip.classList.toggle('on');
      state.genders = [...chips.querySelectorAll('.chip.on')].map(c => c.textContent);
      refreshCharts();
    };
    chips.append(chip);
  }

  const slider = document.getElementById('age-slider');
  const value = document.getElementById('age-value');
  if (opts.age_min !== null) {
    slider.min = opts.age_min;
    slider.max = opts.age_max;
    slider.value = opts.age_min;
    state.minAge = opts.age_min;
    value.textContent = opts.age_min;
    const marks = document.getElementById('age-marks');
    const span = Math.max(1, opts.age_max - opts.age_min);
    for (const m of opts.age_marks) {
      const s = document.createElement('span');
      s.style.left = ((m - opts.age_min) / span * 100) + '%';
      s.textContent = m;
      marks.append(s);
    }
  } else {
    slider.disabled = true;
  }
  slider.oninput = () => { value.textContent = slider.value; };
  slider.onchange = () => { state.minAge = Number(slider.value); refreshCharts(); };
}

async function ask() {
  const button = document.getElementById('ask-button');
  const answer = document.getElementById('answer');
  const question = document.getElementById('user-question').value;
  state.clicks += 1;
  button.disabled = true;
  answer.className = '';
  answer.textContent = question ? 'Thinking…' : '';
  try {
    const res = await fetch('/api/ask', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ clicks: state.clicks, question, client: state.client }),
    });
    const data = await res.json();
    answer.textContent = res.ok ? data.answer : (data.error || 'request failed');
    if (!res.ok || data.answer.startsWith('Error querying the assistant')) answer.className = 'error';
  } catch (e) {
    answer.className = 'error';
    answer.textContent = 'Error querying the assistant: ' + e;
  } finally {
    button.disabled = false;
  }
}

document.getElementById('ask-button').onclick = ask;
loadOptions().then(refreshCharts);
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_has_every_widget_and_panel() {
        for id in [
            "gender-filter",
            "age-slider",
            "user-question",
            "ask-button",
            "answer",
            "id=\"scatter\"",
            "id=\"box_plot\"",
            "id=\"histogram\"",
            "id=\"bar\"",
        ] {
            assert!(INDEX_HTML.contains(id), "missing {id}");
        }
    }

    #[test]
    fn ask_posts_a_per_page_client_id() {
        assert!(INDEX_HTML.contains("client: state.client"));
    }

    #[test]
    fn page_has_no_external_assets() {
        assert!(!INDEX_HTML.contains("<script src"));
        assert!(!INDEX_HTML.contains("<link rel=\"stylesheet\""));
    }
}
