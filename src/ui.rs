use crate::catalog::{EXCHANGE_TIERS, STAKES, TIERS};
use crate::stats::Period;

pub fn render_index(period: &Period) -> String {
    INDEX_HTML
        .replace("{{MONTH}}", period.month())
        .replace("{{TIER_OPTIONS}}", &tier_options())
        .replace("{{GOAL_OPTIONS}}", &goal_options())
        .replace("{{STAKE_OPTIONS}}", &stake_options())
}

fn tier_options() -> String {
    TIERS
        .iter()
        .map(|tier| {
            format!(
                r#"<option value="{}">{} ({}% · x{})</option>"#,
                tier.id, tier.name, tier.label_percent, tier.multiplier
            )
        })
        .collect()
}

fn goal_options() -> String {
    EXCHANGE_TIERS
        .iter()
        .enumerate()
        .map(|(index, goal)| {
            format!(
                r#"<option value="{index}">${} for {} gems</option>"#,
                goal.cash, goal.gems
            )
        })
        .collect()
}

fn stake_options() -> String {
    STAKES
        .iter()
        .map(|stake| {
            let selected = if *stake == 5.0 { " selected" } else { "" };
            format!(r#"<option value="{stake}"{selected}>${stake}</option>"#)
        })
        .collect()
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>SpinTracker Ocean</title>
  <style>
    :root {
      --bg: #020617;
      --panel: rgba(30, 41, 59, 0.7);
      --line: rgba(255, 255, 255, 0.06);
      --ink: #e2e8f0;
      --muted: #94a3b8;
      --accent: #22d3ee;
      --gold: #fbbf24;
      --danger: #f87171;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
      padding: 24px 16px 48px;
    }

    .app {
      width: min(1100px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 20px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      justify-content: space-between;
      align-items: center;
      gap: 12px;
    }

    h1 {
      margin: 0;
      font-size: 1.8rem;
    }

    h1 span {
      color: var(--accent);
    }

    .controls {
      display: flex;
      gap: 8px;
      align-items: center;
    }

    select,
    input,
    button {
      font: inherit;
      color: inherit;
      background: #0f172a;
      border: 1px solid #334155;
      border-radius: 10px;
      padding: 8px 10px;
    }

    button {
      cursor: pointer;
      font-weight: 600;
    }

    button.primary {
      background: var(--accent);
      color: #020617;
      border: none;
    }

    button.active {
      border-color: var(--gold);
      color: var(--gold);
    }

    .cards {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 14px;
    }

    .card,
    .panel {
      background: var(--panel);
      border: 1px solid var(--line);
      border-radius: 14px;
      padding: 16px;
    }

    .card .label {
      font-size: 0.75rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .card .value {
      font-size: 1.6rem;
      font-weight: 700;
      margin-top: 4px;
    }

    .card .sub {
      font-size: 0.8rem;
      color: var(--accent);
      margin-top: 4px;
    }

    .layout {
      display: grid;
      grid-template-columns: 260px 1fr;
      gap: 16px;
    }

    @media (max-width: 800px) {
      .layout {
        grid-template-columns: 1fr;
      }
    }

    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.9rem;
    }

    th,
    td {
      padding: 8px;
      text-align: right;
      border-bottom: 1px solid var(--line);
    }

    th:first-child,
    td:first-child {
      text-align: left;
    }

    th {
      color: var(--muted);
      font-size: 0.75rem;
      text-transform: uppercase;
    }

    .empty {
      text-align: center;
      color: var(--muted);
      font-style: italic;
      padding: 24px;
    }

    dialog {
      background: #0f172a;
      color: var(--ink);
      border: 1px solid #334155;
      border-radius: 16px;
      width: min(480px, 94vw);
    }

    dialog form {
      display: grid;
      gap: 10px;
    }

    dialog label {
      display: grid;
      gap: 4px;
      font-size: 0.75rem;
      text-transform: uppercase;
      color: var(--muted);
    }

    .row {
      display: flex;
      gap: 8px;
      justify-content: flex-end;
    }

    .status {
      min-height: 1.2em;
      font-size: 0.85rem;
      color: var(--muted);
    }

    .status.error {
      color: var(--danger);
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>SpinTracker <span>Ocean</span></h1>
      <div class="controls">
        <select id="month"><option value="{{MONTH}}">{{MONTH}}</option></select>
        <button id="view-month" class="active" type="button">Month</button>
        <button id="view-year" type="button">Year</button>
        <button id="open-settings" type="button">Settings</button>
        <button id="open-session" class="primary" type="button">New session</button>
      </div>
    </header>

    <p id="status" class="status" role="status"></p>

    <section class="cards">
      <div class="card"><div class="label">Effective rakeback</div><div id="effective" class="value">0.0%</div><div id="effective-sub" class="sub"></div></div>
      <div class="card"><div class="label">Ocean gems</div><div id="gems" class="value">$0.00</div><div id="gems-sub" class="sub"></div></div>
      <div class="card"><div class="label">Tide points</div><div id="tp" class="value">0</div><div id="tp-sub" class="sub"></div></div>
      <div class="card"><div class="label">Games</div><div id="games" class="value">0</div><div id="games-sub" class="sub"></div></div>
    </section>

    <section class="layout">
      <aside class="panel">
        <h3>Stakes</h3>
        <table>
          <thead><tr><th>Stake</th><th>Spins</th><th>Rake</th></tr></thead>
          <tbody id="stakes"></tbody>
        </table>
        <h3>Extras</h3>
        <table>
          <tbody>
            <tr><td>Mining</td><td id="mining">$0.00</td><td id="mining-pct">0.0%</td></tr>
            <tr><td>Leaderboard</td><td id="leaderboard">$0.00</td><td id="leaderboard-pct">0.0%</td></tr>
          </tbody>
        </table>
      </aside>

      <section class="panel">
        <table>
          <thead id="table-head"></thead>
          <tbody id="table-body"></tbody>
        </table>
      </section>
    </section>
  </main>

  <dialog id="session-dialog">
    <form id="session-form" method="dialog">
      <h2 id="session-title">New session</h2>
      <input type="hidden" name="id" />
      <label>Date <input type="date" name="date" required /></label>
      <label>Stake (buy-in) <select name="buy_in">{{STAKE_OPTIONS}}</select></label>
      <label>Games <input type="number" name="games_count" min="0" step="1" value="0" /></label>
      <label>Tide points observed (solves PVI) <input type="number" id="observed-tp" min="0" step="any" /></label>
      <label>PVI <input type="number" name="pvi" min="0.1" max="2.0" step="0.01" value="0.5" /></label>
      <label>Leaderboard prize <input type="number" name="leaderboard_prize" min="0" step="0.01" value="0" /></label>
      <label>Mining prize <input type="number" name="mining_prize" min="0" step="0.01" value="0" /></label>
      <label>Notes <input type="text" name="notes" /></label>
      <div class="row">
        <button type="button" data-close>Cancel</button>
        <button type="submit" class="primary">Save</button>
      </div>
    </form>
  </dialog>

  <dialog id="settings-dialog">
    <form id="settings-form" method="dialog">
      <h2>Settings</h2>
      <label>Ocean rank <select name="ocean_rank">{{TIER_OPTIONS}}</select></label>
      <label>Exchange goal <select name="exchange_goal_index">{{GOAL_OPTIONS}}</select></label>
      <label>Default PVI <input type="number" name="default_pvi" min="0.1" max="2.0" step="0.01" /></label>
      <div class="row">
        <button type="button" data-close>Cancel</button>
        <button type="submit" class="primary">Save</button>
      </div>
    </form>
  </dialog>

  <script>
    const $ = (id) => document.getElementById(id);
    const money = new Intl.NumberFormat('en-US', { style: 'currency', currency: 'USD' });
    const number = new Intl.NumberFormat('en-US', { maximumFractionDigits: 0 });
    const pct = (value) => `${(value || 0).toFixed(1)}%`;
    const statusEl = $('status');

    let yearView = false;
    let settings = null;
    let sessionsById = {};

    const setStatus = (message, kind) => {
      statusEl.textContent = message;
      statusEl.className = `status ${kind || ''}`;
    };

    const api = async (path, options = {}) => {
      const res = await fetch(path, {
        headers: { 'content-type': 'application/json' },
        ...options
      });
      if (!res.ok) {
        const body = await res.json().catch(() => ({}));
        throw new Error(body.error || `Request failed (${res.status})`);
      }
      return res.status === 204 ? null : res.json();
    };

    const loadMonths = async () => {
      const { months } = await api('/api/months');
      const select = $('month');
      const current = select.value;
      select.innerHTML = months.map((m) => `<option value="${m}">${m}</option>`).join('');
      select.value = months.includes(current) ? current : months[0];
    };

    const renderStakes = (stats) => {
      const body = $('stakes');
      if (stats.stakes_breakdown.length === 0) {
        body.innerHTML = '<tr><td colspan="3" class="empty">No games</td></tr>';
        return;
      }
      body.innerHTML = stats.stakes_breakdown
        .map((row) => `<tr><td>$${row.stake}</td><td>${number.format(row.count)}</td><td>${money.format(row.rake)}</td></tr>`)
        .join('');
    };

    const renderYear = (stats) => {
      $('table-head').innerHTML = '<tr><th>Month</th><th>Games</th><th>Rake</th><th>TP</th><th>Gems</th><th>Mining</th><th>Leaderboard</th><th>Total RB</th></tr>';
      const rows = stats.months_breakdown.map((row) => `<tr>
        <td>${row.month}</td><td>${number.format(row.games)}</td><td>${money.format(row.rake)}</td>
        <td>${number.format(row.tide_points)}</td><td>${money.format(row.gem_value)}</td>
        <td>${money.format(row.mining)}</td><td>${money.format(row.leaderboard)}</td>
        <td>${money.format(row.total_rakeback)}</td></tr>`);
      $('table-body').innerHTML = rows.length
        ? rows.join('')
        : `<tr><td colspan="8" class="empty">No activity in ${stats.year}.</td></tr>`;
    };

    const renderMonth = (stats) => {
      $('table-head').innerHTML = '<tr><th>Date</th><th>Stake</th><th>Games</th><th>PVI</th><th>TP</th><th>Gems</th><th>Extras</th><th>Total RB</th><th></th></tr>';
      sessionsById = {};
      const rows = stats.sessions.map((row) => {
        sessionsById[row.id] = row;
        const m = row.metrics;
        return `<tr>
          <td>${row.date}</td><td>$${row.buy_in}</td><td>${number.format(row.games_count)}</td>
          <td>${Number(row.pvi).toFixed(2)}</td><td>${number.format(m.tide_points)}</td>
          <td>${money.format(m.gem_value)} (${pct(m.ocean_rb_percent)})</td>
          <td>${money.format(row.mining_prize + row.leaderboard_prize)}</td>
          <td>${money.format(m.total_rakeback)}</td>
          <td><button type="button" data-edit="${row.id}">Edit</button> <button type="button" data-delete="${row.id}">Delete</button></td>
        </tr>`;
      });
      $('table-body').innerHTML = rows.length
        ? rows.join('')
        : `<tr><td colspan="9" class="empty">No sessions in ${stats.month}.</td></tr>`;
    };

    const loadStats = async () => {
      const month = $('month').value;
      const view = yearView ? 'year' : 'month';
      const stats = await api(`/api/stats?month=${encodeURIComponent(month)}&view=${view}`);

      $('effective').textContent = pct(stats.effective_rb_percent);
      $('effective-sub').textContent = `${money.format(stats.total_rakeback)} of ${money.format(stats.total_rake_gross)} rake`;
      $('gems').textContent = money.format(stats.total_gem_value);
      $('gems-sub').textContent = `${number.format(stats.total_gems)} gems · ${pct(stats.ocean_rb_percent)} · ${stats.current_tier.name}`;
      $('tp').textContent = number.format(stats.total_tide_points);
      $('tp-sub').textContent = `avg PVI ${stats.avg_pvi.toFixed(2)}`;
      $('games').textContent = number.format(stats.total_games);
      $('games-sub').textContent = yearView ? `Year ${stats.year}` : stats.month;
      $('mining').textContent = money.format(stats.total_mining);
      $('mining-pct').textContent = pct(stats.mining_rb_percent);
      $('leaderboard').textContent = money.format(stats.total_leaderboard);
      $('leaderboard-pct').textContent = pct(stats.leaderboard_rb_percent);

      renderStakes(stats);
      if (yearView) {
        renderYear(stats);
      } else {
        renderMonth(stats);
      }
      $('open-session').hidden = yearView;
    };

    const refresh = async () => {
      await loadMonths();
      await loadStats();
    };

    const setView = (year) => {
      yearView = year;
      $('view-year').classList.toggle('active', year);
      $('view-month').classList.toggle('active', !year);
      loadStats().catch((err) => setStatus(err.message, 'error'));
    };

    const sessionForm = $('session-form');

    const openSession = (session) => {
      const today = new Date().toISOString().slice(0, 10);
      const values = session || {
        id: '', date: today, buy_in: 5, games_count: 0,
        pvi: settings ? settings.default_pvi : 0.5,
        leaderboard_prize: 0, mining_prize: 0, notes: ''
      };
      for (const field of ['id', 'date', 'buy_in', 'games_count', 'pvi', 'leaderboard_prize', 'mining_prize', 'notes']) {
        sessionForm.elements[field].value = values[field];
      }
      $('observed-tp').value = '';
      $('session-title').textContent = session ? 'Edit session' : 'New session';
      $('session-dialog').showModal();
    };

    const solvePvi = async () => {
      const observed = $('observed-tp').value;
      const games = parseInt(sessionForm.elements.games_count.value, 10) || 0;
      const buyIn = sessionForm.elements.buy_in.value;
      if (!observed || games <= 0) {
        return;
      }
      const result = await api(`/api/pvi?buy_in=${buyIn}&games=${games}&tide_points=${encodeURIComponent(observed)}`);
      if (result.pvi_rounded !== null) {
        sessionForm.elements.pvi.value = result.pvi_rounded.toFixed(2);
      }
    };

    sessionForm.addEventListener('submit', (event) => {
      event.preventDefault();
      const form = sessionForm.elements;
      const body = {
        date: form.date.value,
        buy_in: form.buy_in.value,
        games_count: form.games_count.value,
        pvi: form.pvi.value,
        leaderboard_prize: form.leaderboard_prize.value,
        mining_prize: form.mining_prize.value,
        notes: form.notes.value
      };
      const id = form.id.value;
      const request = id
        ? api(`/api/sessions/${encodeURIComponent(id)}`, { method: 'PUT', body: JSON.stringify(body) })
        : api('/api/sessions', { method: 'POST', body: JSON.stringify(body) });
      request
        .then(() => {
          $('session-dialog').close();
          setStatus('Saved', 'ok');
          return refresh();
        })
        .catch((err) => setStatus(err.message, 'error'));
    });

    const settingsForm = $('settings-form');

    settingsForm.addEventListener('submit', (event) => {
      event.preventDefault();
      const form = settingsForm.elements;
      const body = {
        ocean_rank: form.ocean_rank.value,
        exchange_goal_index: form.exchange_goal_index.value,
        default_pvi: form.default_pvi.value
      };
      api('/api/settings', { method: 'PUT', body: JSON.stringify(body) })
        .then((saved) => {
          settings = saved;
          $('settings-dialog').close();
          return loadStats();
        })
        .catch((err) => setStatus(err.message, 'error'));
    });

    $('open-settings').addEventListener('click', () => {
      if (settings) {
        settingsForm.elements.ocean_rank.value = settings.ocean_rank;
        settingsForm.elements.exchange_goal_index.value = String(settings.exchange_goal_index);
        settingsForm.elements.default_pvi.value = settings.default_pvi;
      }
      $('settings-dialog').showModal();
    });

    $('table-body').addEventListener('click', (event) => {
      const editId = event.target.dataset.edit;
      const deleteId = event.target.dataset.delete;
      if (editId && sessionsById[editId]) {
        openSession(sessionsById[editId]);
      } else if (deleteId && confirm('Delete this session?')) {
        api(`/api/sessions/${encodeURIComponent(deleteId)}`, { method: 'DELETE' })
          .then(refresh)
          .catch((err) => setStatus(err.message, 'error'));
      }
    });

    document.querySelectorAll('[data-close]').forEach((button) => {
      button.addEventListener('click', () => button.closest('dialog').close());
    });

    $('observed-tp').addEventListener('input', () => solvePvi().catch((err) => setStatus(err.message, 'error')));
    sessionForm.elements.games_count.addEventListener('input', () => solvePvi().catch(() => {}));
    sessionForm.elements.buy_in.addEventListener('change', () => solvePvi().catch(() => {}));
    $('open-session').addEventListener('click', () => openSession(null));
    $('view-month').addEventListener('click', () => setView(false));
    $('view-year').addEventListener('click', () => setView(true));
    $('month').addEventListener('change', () => loadStats().catch((err) => setStatus(err.message, 'error')));

    api('/api/settings')
      .then((loaded) => { settings = loaded; })
      .then(refresh)
      .catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"#;
