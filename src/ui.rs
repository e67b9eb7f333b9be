use crate::repo::RepoRef;

pub fn render_index(sample_repo: &RepoRef) -> String {
    INDEX_HTML.replace("{{SAMPLE_REPO}}", &escape_html(&sample_repo.to_string()))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <meta name="description" content="Grep todo history from repository" />
  <title>GrepTodo</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Noto+Serif:wght@300&display=swap');

    :root {
      --bg-1: #f4f0fb;
      --bg-2: #d9cdf5;
      --ink: #2b2a28;
      --accent: #7c4dff;
      --add: #2d9c6b;
      --remove: #d9534f;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(60, 40, 110, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #ece6fa 60%, #f7f4fd 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 64px;
    }

    #background {
      position: fixed;
      inset: 0;
      z-index: -1;
      margin: 0;
      padding-left: 16px;
      overflow: hidden;
      color: rgba(90, 80, 110, 0.25);
      font-size: 0.8rem;
      white-space: pre-wrap;
      pointer-events: none;
    }

    .app {
      width: min(960px, 100%);
      background: var(--card);
      backdrop-filter: blur(12px);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
      animation: rise 600ms ease;
    }

    header {
      display: grid;
      gap: 16px;
    }

    .title-row {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 16px;
    }

    h1 {
      font-family: "Noto Serif", "Georgia", serif;
      font-weight: 300;
      font-size: clamp(2rem, 4vw, 2.8rem);
      margin: 0;
    }

    .subtitle {
      margin: 0;
      color: #5f5c57;
      font-size: 1rem;
    }

    .search-input {
      width: 100%;
      padding: 14px 18px;
      border-radius: 16px;
      border: 1px solid rgba(124, 77, 255, 0.3);
      font-size: 1.05rem;
      font-family: inherit;
    }

    .actions {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 16px;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 14px 20px;
      font-size: 1rem;
      font-weight: 600;
      cursor: pointer;
      transition: transform 150ms ease, box-shadow 150ms ease;
      display: inline-flex;
      align-items: center;
      justify-content: center;
      gap: 10px;
    }

    button:active {
      transform: scale(0.98);
    }

    .btn-search {
      background: var(--accent);
      color: white;
      box-shadow: 0 10px 24px rgba(124, 77, 255, 0.3);
    }

    .btn-lucky {
      background: #ece6fa;
      color: var(--accent);
    }

    .btn-reset {
      background: transparent;
      color: var(--remove);
      padding: 8px 12px;
    }

    .btn-reset[hidden] {
      display: none;
    }

    .indicator {
      display: flex;
      align-items: center;
      gap: 10px;
      font-size: 0.95rem;
      color: #6b645d;
    }

    .dot {
      width: 12px;
      height: 12px;
      border-radius: 50%;
      background: #c9c3d6;
    }

    .indicator[data-status="searching"] .dot {
      background: var(--accent);
      animation: pulse 900ms ease-in-out infinite;
    }

    .indicator[data-status="done"] .dot {
      background: var(--add);
    }

    .chart-card {
      background: white;
      border-radius: 20px;
      padding: 16px;
      border: 1px solid rgba(60, 40, 110, 0.08);
      display: grid;
      gap: 10px;
    }

    .chart-card h2 {
      margin: 0;
      font-size: 1.2rem;
      text-align: center;
    }

    .chart-card svg {
      width: 100%;
      display: block;
    }

    .chart-card svg text {
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
    }

    .chart-note {
      min-height: 1.2em;
      font-size: 0.9rem;
      color: #6b645d;
      text-align: center;
    }

    .chart-note[data-type="error"] {
      color: #c63b2b;
    }

    .line-add {
      fill: none;
      stroke: var(--add);
      stroke-width: 3;
    }

    .line-remove {
      fill: none;
      stroke: var(--remove);
      stroke-width: 3;
    }

    .bar-add {
      fill: var(--add);
    }

    .bar-remove {
      fill: var(--remove);
    }

    .bar-total {
      fill: var(--accent);
    }

    .chart-grid {
      stroke: rgba(60, 40, 110, 0.12);
    }

    .chart-axis {
      stroke: rgba(60, 40, 110, 0.3);
      stroke-dasharray: 4 6;
    }

    .chart-label {
      fill: #7a746d;
      font-size: 11px;
    }

    .legend {
      display: flex;
      justify-content: center;
      gap: 18px;
      font-size: 0.85rem;
      color: #6b645d;
    }

    .legend span::before {
      content: "";
      display: inline-block;
      width: 10px;
      height: 10px;
      border-radius: 3px;
      margin-right: 6px;
      background: var(--swatch);
    }

    .status {
      font-size: 0.95rem;
      color: #6b645d;
      min-height: 1.2em;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    footer {
      display: flex;
      flex-wrap: wrap;
      gap: 18px;
      font-size: 0.85rem;
      color: #6f6a65;
    }

    footer a {
      color: inherit;
    }

    @keyframes rise {
      from {
        opacity: 0;
        transform: translateY(18px);
      }
      to {
        opacity: 1;
        transform: translateY(0);
      }
    }

    @keyframes pulse {
      0%, 100% {
        transform: scale(1);
      }
      50% {
        transform: scale(1.5);
      }
    }

    @media (max-width: 600px) {
      .app {
        padding: 28px 22px;
      }
      button {
        width: 100%;
      }
    }
  </style>
</head>
<body>
  <pre id="background" aria-hidden="true"></pre>

  <main class="app">
    <header>
      <div class="title-row">
        <h1>GrepTodo</h1>
        <button class="btn-reset" id="reset-btn" type="button" hidden>Reset</button>
      </div>
      <p class="subtitle">Grep TODO history from a repository.</p>
      <form id="search-form">
        <input class="search-input" id="search-input" placeholder="user/repo" autocomplete="off" />
      </form>
      <section class="actions">
        <button class="btn-search" id="search-btn" type="button">Search</button>
        <button class="btn-lucky" id="lucky-btn" type="button">Feel Lucky ({{SAMPLE_REPO}})</button>
      </section>
      <div class="indicator" id="indicator" data-status="idle">
        <span class="dot"></span>
        <span id="indicator-text">idle</span>
      </div>
    </header>

    <section class="chart-card">
      <h2>TODO Operation Count</h2>
      <svg id="chart-count" viewBox="0 0 600 240" role="img" aria-label="Operation count"></svg>
      <div class="legend">
        <span style="--swatch: var(--add)">Add</span>
        <span style="--swatch: var(--remove)">Remove</span>
      </div>
      <div class="chart-note" id="note-count"></div>
    </section>

    <section class="chart-card">
      <h2>TODO Operation History</h2>
      <svg id="chart-history" viewBox="0 0 600 300" role="img" aria-label="Operation history"></svg>
      <div class="legend">
        <span style="--swatch: var(--add)">Add</span>
        <span style="--swatch: var(--remove)">Remove</span>
      </div>
      <div class="chart-note" id="note-history"></div>
    </section>

    <section class="chart-card">
      <h2>TODO Author Rank</h2>
      <svg id="chart-rank" viewBox="0 0 600 300" role="img" aria-label="Author rank"></svg>
      <div class="legend">
        <span style="--swatch: var(--accent)">Total</span>
        <span style="--swatch: var(--add)">Add</span>
        <span style="--swatch: var(--remove)">Remove</span>
      </div>
      <div class="chart-note" id="note-rank"></div>
    </section>

    <div class="status" id="status"></div>

    <footer>
      <a href="https://github.com/waynexia/greptodo">waynexia/greptodo</a>
      <a href="https://greptime.cloud">Greptime Cloud</a>
    </footer>
  </main>

  <script>
    const searchForm = document.getElementById('search-form');
    const searchInput = document.getElementById('search-input');
    const searchBtn = document.getElementById('search-btn');
    const luckyBtn = document.getElementById('lucky-btn');
    const resetBtn = document.getElementById('reset-btn');
    const indicatorEl = document.getElementById('indicator');
    const indicatorText = document.getElementById('indicator-text');
    const statusEl = document.getElementById('status');
    const backgroundEl = document.getElementById('background');

    const charts = {
      operation_count: { svg: document.getElementById('chart-count'), note: document.getElementById('note-count') },
      operation_history: { svg: document.getElementById('chart-history'), note: document.getElementById('note-history') },
      author_rank: { svg: document.getElementById('chart-rank'), note: document.getElementById('note-rank') }
    };

    let pollTimer = null;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const escapeText = (value) =>
      String(value).replace(/[&<>"]/g, (ch) => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;' })[ch]);

    const formatAxisValue = (value) => {
      const rounded = Math.round(value * 10) / 10;
      return Number.isInteger(rounded) ? rounded.toString() : rounded.toFixed(1);
    };

    const emptyChart = (svg, message) => {
      svg.innerHTML = `<text class="chart-label" x="50%" y="50%" text-anchor="middle">${escapeText(message)}</text>`;
    };

    const valueRange = (values) => {
      let min = Math.min(0, ...values);
      let max = Math.max(0, ...values);
      if (min === max) {
        min -= 1;
        max += 1;
      }
      return { min, max, range: max - min };
    };

    const renderCount = (svg, totals) => {
      const sum = totals.add + totals.remove;
      if (sum <= 0) {
        emptyChart(svg, 'No data yet');
        return;
      }
      const cx = 300;
      const cy = 120;
      const outer = 100;
      const inner = 58;
      const arc = (start, end, cls) => {
        if (end - start >= Math.PI * 2 - 1e-6) {
          return arc(start, start + Math.PI, cls) + arc(start + Math.PI, end, cls);
        }
        const large = end - start > Math.PI ? 1 : 0;
        const p = (r, a) => `${(cx + r * Math.sin(a)).toFixed(2)} ${(cy - r * Math.cos(a)).toFixed(2)}`;
        return `<path class="${cls}" d="M ${p(outer, start)} A ${outer} ${outer} 0 ${large} 1 ${p(outer, end)} L ${p(inner, end)} A ${inner} ${inner} 0 ${large} 0 ${p(inner, start)} Z" />`;
      };
      const split = (totals.add / sum) * Math.PI * 2;
      svg.innerHTML = `
        ${totals.add > 0 ? arc(0, split, 'bar-add') : ''}
        ${totals.remove > 0 ? arc(split, Math.PI * 2, 'bar-remove') : ''}
        <text class="chart-label" x="${cx}" y="${cy - 4}" text-anchor="middle">+${totals.add} / -${totals.remove}</text>
        <text class="chart-label" x="${cx}" y="${cy + 14}" text-anchor="middle">net ${totals.total}</text>
      `;
    };

    const renderHistory = (svg, series) => {
      if (!series.keys.length) {
        emptyChart(svg, 'No data yet');
        return;
      }
      const width = 600;
      const height = 300;
      const paddingX = 44;
      const paddingY = 40;
      const top = 20;
      const { min, range } = valueRange([...series.add, ...series.remove]);
      const xStep = series.keys.length > 1 ? (width - paddingX * 2) / (series.keys.length - 1) : 0;
      const scaleY = (height - top - paddingY) / range;
      const x = (index) => paddingX + index * xStep;
      const y = (value) => height - paddingY - (value - min) * scaleY;
      const path = (values) =>
        values.map((value, index) => `${index === 0 ? 'M' : 'L'} ${x(index).toFixed(2)} ${y(value).toFixed(2)}`).join(' ');

      const ticks = 4;
      let grid = '';
      for (let i = 0; i <= ticks; i += 1) {
        const value = min + (range * i) / ticks;
        const yPos = y(value);
        grid += `<line class="chart-grid" x1="${paddingX}" y1="${yPos}" x2="${width - paddingX}" y2="${yPos}" />`;
        grid += `<text class="chart-label" x="${paddingX - 10}" y="${yPos + 4}" text-anchor="end">${formatAxisValue(value)}</text>`;
      }

      const labelEvery = Math.max(1, Math.ceil(series.keys.length / 6));
      const xLabels = series.keys
        .map((key, index) => {
          if (index % labelEvery !== 0) {
            return '';
          }
          return `<text class="chart-label" x="${x(index)}" y="${height - paddingY + 18}" text-anchor="middle">${escapeText(key)}</text>`;
        })
        .join('');

      svg.innerHTML = `
        ${grid}
        <line class="chart-axis" x1="${paddingX}" y1="${y(0)}" x2="${width - paddingX}" y2="${y(0)}" />
        <path class="line-add" d="${path(series.add)}" />
        <path class="line-remove" d="${path(series.remove)}" />
        ${xLabels}
      `;
    };

    const renderRank = (svg, series) => {
      if (!series.keys.length) {
        emptyChart(svg, 'No data yet');
        return;
      }
      const width = 600;
      const rowHeight = 28;
      const labelWidth = 140;
      const right = 40;
      const height = Math.max(120, series.keys.length * rowHeight + 20);
      const total = series.total || series.add.map((value, index) => value + series.remove[index]);
      const { min, range } = valueRange([...series.add, ...series.remove, ...total]);
      const scaleX = (width - labelWidth - right) / range;
      const x = (value) => labelWidth + (value - min) * scaleX;
      const bar = (cls, from, to, yPos, h) =>
        `<rect class="${cls}" x="${Math.min(x(from), x(to)).toFixed(2)}" y="${yPos.toFixed(2)}" width="${Math.abs(x(to) - x(from)).toFixed(2)}" height="${h}" rx="3" />`;

      // Horizontal bars list bottom to top, so the last author sits on top.
      const rows = series.keys
        .map((key, index) => {
          const yPos = height - 10 - (index + 1) * rowHeight;
          return `
            <text class="chart-label" x="${labelWidth - 8}" y="${yPos + rowHeight / 2 + 4}" text-anchor="end">${escapeText(key)}</text>
            ${bar('bar-add', 0, series.add[index], yPos + 4, 9)}
            ${bar('bar-remove', series.remove[index], 0, yPos + 4, 9)}
            ${bar('bar-total', 0, total[index], yPos + 15, 9)}
            <text class="chart-label" x="${x(Math.max(0, total[index])) + 6}" y="${yPos + 23}">${total[index]}</text>
          `;
        })
        .join('');

      svg.setAttribute('viewBox', `0 0 ${width} ${height}`);
      svg.innerHTML = `
        <line class="chart-axis" x1="${x(0)}" y1="0" x2="${x(0)}" y2="${height}" />
        ${rows}
      `;
    };

    const renderers = {
      operation_count: renderCount,
      operation_history: renderHistory,
      author_rank: renderRank
    };

    const renderSlot = (name, slot) => {
      const { svg, note } = charts[name];
      note.dataset.type = '';
      if (slot.status === 'idle') {
        emptyChart(svg, 'Search a repository to start');
        note.textContent = '';
      } else if (slot.status === 'loading') {
        emptyChart(svg, 'Loading...');
        note.textContent = slot.repo || '';
      } else if (slot.status === 'failed') {
        emptyChart(svg, 'Query failed');
        note.textContent = slot.error || 'Query failed';
        note.dataset.type = 'error';
      } else {
        renderers[name](svg, slot.data);
        note.textContent = slot.repo || '';
      }
    };

    const render = (dashboard) => {
      indicatorEl.dataset.status = dashboard.status;
      const repo = dashboard.repo ? `${dashboard.repo.org}/${dashboard.repo.repo}` : '';
      indicatorText.textContent = repo ? `${dashboard.status}: ${repo}` : dashboard.status;
      resetBtn.hidden = dashboard.status === 'idle';
      if (dashboard.crawl && dashboard.crawl.error) {
        setStatus(`Crawler: ${dashboard.crawl.error}`, 'error');
      }
      Object.keys(charts).forEach((name) => renderSlot(name, dashboard[name]));

      clearTimeout(pollTimer);
      if (dashboard.status === 'searching') {
        pollTimer = setTimeout(() => loadDashboard().catch((err) => setStatus(err.message, 'error')), 1000);
      }
    };

    const loadDashboard = async () => {
      const res = await fetch('/api/dashboard');
      if (!res.ok) {
        throw new Error('Unable to load dashboard');
      }
      render(await res.json());
    };

    const post = async (url, body) => {
      const res = await fetch(url, {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify(body || {})
      });
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      setStatus('', '');
      render(await res.json());
    };

    const startSearch = () => {
      const repo = searchInput.value.trim();
      const parts = repo.split('/');
      if (parts.length !== 2 || !parts[0] || !parts[1]) {
        setStatus('Repository should look like user/repo', 'error');
        return;
      }
      post('/api/search', { repo }).catch((err) => setStatus(err.message, 'error'));
    };

    const animateBackground = (text) => {
      let index = 0;
      const step = () => {
        index += 3;
        backgroundEl.textContent = text.slice(0, index);
        if (index < text.length) {
          setTimeout(step, 16);
        }
      };
      step();
    };

    const loadBackground = async () => {
      const res = await fetch('/api/samples');
      if (!res.ok) {
        return;
      }
      const samples = await res.json();
      if (samples.files.length) {
        animateBackground(samples.files.join('\n\n'));
      }
    };

    searchForm.addEventListener('submit', (event) => {
      event.preventDefault();
      startSearch();
    });
    searchBtn.addEventListener('click', startSearch);
    luckyBtn.addEventListener('click', () => post('/api/lucky').catch((err) => setStatus(err.message, 'error')));
    resetBtn.addEventListener('click', () => post('/api/reset').catch((err) => setStatus(err.message, 'error')));

    loadDashboard().catch((err) => setStatus(err.message, 'error'));
    loadBackground().catch(() => {});
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_mentions_sample_repo() {
        let repo = RepoRef::parse("waynexia/unkai").unwrap();
        let html = render_index(&repo);
        assert!(html.contains("Feel Lucky (waynexia/unkai)"));
        assert!(!html.contains("{{SAMPLE_REPO}}"));
    }

    #[test]
    fn index_escapes_sample_repo() {
        let repo = RepoRef::parse("<b>/x").unwrap();
        assert!(render_index(&repo).contains("&lt;b&gt;/x"));
    }
}
